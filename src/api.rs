// src/api.rs
use crate::auth::TokenIssuer;
use crate::bank::LinkDelay;
use crate::config::Settings;
use crate::db::{AppState, Db};
use crate::error::{AppError, Result};
use crate::models::{Asset, AssetKind, BankAccount, Holding, Session, User};
use crate::validation;
use crate::zakat::ZakatReport;
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::future::Future;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub holdings: Vec<Holding>,
    pub total_value: Decimal,
}

/// Operations issued by the console. Every mutation is written through to the
/// snapshot files. When that write fails the change stays in memory and the
/// persistence error is returned so the caller can warn about it.
pub struct Api {
    state: AppState,
    db: Db,
    tokens: TokenIssuer,
    link_delay: LinkDelay,
}

impl Api {
    pub fn new(state: AppState, db: Db, tokens: TokenIssuer, link_delay: LinkDelay) -> Self {
        Api {
            state,
            db,
            tokens,
            link_delay,
        }
    }

    pub async fn from_settings(settings: &Settings) -> Self {
        let db = Db::new(&settings.data_dir);
        let state = db.load_or_default().await;
        Api::new(
            state,
            db,
            TokenIssuer::new(&settings.token_secret, settings.session_ttl()),
            LinkDelay::new(settings.link_delay()),
        )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn username_available(&self, username: &str) -> bool {
        self.state.users.is_available(username.trim())
    }

    pub async fn sign_up(
        &mut self,
        username: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let username = validation::username(username)?;
        let name = validation::non_empty("name", name)?;
        let email = validation::email(email)?;
        let password = validation::password(password)?;

        let user = match self
            .state
            .users
            .register(&username, &name, &email, &password)
        {
            Ok(user) => user,
            Err(e) => {
                warn!("Sign-up rejected for {}: {}", username, e);
                return Err(e);
            }
        };
        info!("Registered user {}", username);
        self.persist().await?;
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(Session, User)> {
        let username = username.trim();
        let user = match self.state.users.authenticate(username, password) {
            Ok(user) => user.clone(),
            Err(e) => {
                warn!("Failed login attempt");
                return Err(e);
            }
        };
        let token = self.tokens.create_token(username)?;
        info!("User {} logged in", username);
        Ok((
            Session {
                username: username.to_string(),
                token,
            },
            user,
        ))
    }

    pub fn portfolio(&self, session: &Session) -> Result<PortfolioView> {
        let username = self.authorize(session)?;
        Ok(PortfolioView {
            holdings: self.state.portfolios.list(&username),
            total_value: self.state.portfolios.total_value(&username),
        })
    }

    pub async fn add_asset(
        &mut self,
        session: &Session,
        kind: AssetKind,
        quantity: Decimal,
    ) -> Result<()> {
        let username = self.authorize(session)?;
        if let Err(e) = self.state.portfolios.add(&username, kind, quantity) {
            error!("Failed to add asset: {}", e);
            return Err(e);
        }
        info!("Asset {} x{} added for {}", kind, quantity, username);
        self.persist().await
    }

    pub async fn edit_asset(
        &mut self,
        session: &Session,
        index: usize,
        quantity: Decimal,
    ) -> Result<()> {
        let username = self.authorize(session)?;
        if let Err(e) = self.state.portfolios.edit(&username, index, quantity) {
            error!("Failed to update asset: {}", e);
            return Err(e);
        }
        info!("Asset {} updated for {}", index, username);
        self.persist().await
    }

    pub async fn remove_asset(&mut self, session: &Session, index: usize) -> Result<Asset> {
        let username = self.authorize(session)?;
        let removed = match self.state.portfolios.remove(&username, index) {
            Ok(asset) => asset,
            Err(e) => {
                error!("Failed to remove asset: {}", e);
                return Err(e);
            }
        };
        info!("Asset {} ({}) removed for {}", index, removed.kind(), username);
        self.persist().await?;
        Ok(removed)
    }

    /// `None` when the portfolio is empty.
    pub fn zakat_report(&self, session: &Session) -> Result<Option<ZakatReport>> {
        let username = self.authorize(session)?;
        Ok(ZakatReport::from_holdings(
            &self.state.portfolios.list(&username),
        ))
    }

    /// The OTP is only format-checked. The link is recorded after the simulated
    /// verification delay, so a cancelled delay changes nothing.
    pub async fn connect_bank<F>(
        &mut self,
        session: &Session,
        bank_name: &str,
        card_number: &str,
        otp: &str,
        cancel: F,
    ) -> Result<BankAccount>
    where
        F: Future<Output = ()>,
    {
        let username = self.authorize(session)?;
        let bank_name = validation::non_empty("bank name", bank_name)?;
        let card_number = validation::card_number(card_number)?;
        validation::otp(otp)?;

        self.link_delay.wait(cancel).await?;

        let account = self
            .state
            .bank_accounts
            .link(&username, &bank_name, &card_number);
        info!(
            "Bank account {} {} linked for {}",
            account.bank_name,
            account.masked_card_number(),
            username
        );
        self.persist().await?;
        Ok(account)
    }

    pub fn bank_account(&self, session: &Session) -> Result<Option<BankAccount>> {
        let username = self.authorize(session)?;
        Ok(self.state.bank_accounts.get(&username).cloned())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.persist().await?;
        info!("All stores saved to {}", self.db.dir().display());
        Ok(())
    }

    fn authorize(&self, session: &Session) -> Result<String> {
        let username = self.tokens.verify_token(&session.token)?;
        if username != session.username || self.state.users.get(&username).is_none() {
            return Err(AppError::AuthFailure);
        }
        Ok(username)
    }

    async fn persist(&self) -> Result<()> {
        self.db.save(&self.state).await.map_err(|e| {
            error!("Error saving data: {}", e);
            e
        })
    }
}
