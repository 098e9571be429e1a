// src/db.rs
use crate::accounts::UserRegistry;
use crate::bank::BankLinks;
use crate::error::{AppError, Result};
use crate::portfolio::PortfolioStore;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const USERS_FILE: &str = "users.json";
pub const PORTFOLIOS_FILE: &str = "portfolios.json";
pub const BANK_ACCOUNTS_FILE: &str = "bank_accounts.json";

/// Everything the application keeps between runs. The three stores are independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub users: UserRegistry,
    pub portfolios: PortfolioStore,
    pub bank_accounts: BankLinks,
}

/// Whole-file JSON snapshots in a single directory. Every save overwrites all
/// three files; there is no atomic rename, so a crash mid-write can leave a
/// truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct Db {
    dir: PathBuf,
}

impl Db {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Db { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Missing files load as empty stores. Any other failure is returned.
    pub async fn load(&self) -> Result<AppState> {
        let state = AppState {
            users: self.read_snapshot(USERS_FILE).await?,
            portfolios: self.read_snapshot(PORTFOLIOS_FILE).await?,
            bank_accounts: self.read_snapshot(BANK_ACCOUNTS_FILE).await?,
        };
        info!(
            "Loaded {} users from {}",
            state.users.len(),
            self.dir.display()
        );
        Ok(state)
    }

    /// Falls back to empty stores when the snapshots cannot be read. A corrupt
    /// snapshot therefore loses its data instead of blocking startup.
    pub async fn load_or_default(&self) -> AppState {
        match self.load().await {
            Ok(state) => state,
            Err(e) => {
                error!("Error loading data, starting with empty stores: {}", e);
                AppState::default()
            }
        }
    }

    pub async fn save(&self, state: &AppState) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| AppError::Persistence {
                path: self.dir.clone(),
                source,
            })?;
        self.write_snapshot(USERS_FILE, &state.users).await?;
        self.write_snapshot(PORTFOLIOS_FILE, &state.portfolios).await?;
        self.write_snapshot(BANK_ACCOUNTS_FILE, &state.bank_accounts)
            .await?;
        Ok(())
    }

    async fn read_snapshot<T>(&self, file: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.dir.join(file);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => return Err(AppError::Persistence { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| AppError::Snapshot { path, source })
    }

    async fn write_snapshot<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_vec_pretty(value).map_err(|source| AppError::Snapshot {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json)
            .await
            .map_err(|source| AppError::Persistence { path, source })
    }
}
