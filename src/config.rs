// src/config.rs
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

/// Personal portfolio tracker with zakat calculation.
#[derive(Parser, Debug, Clone)]
#[command(name = "investwise", version, about, long_about = None)]
pub struct Settings {
    /// Directory holding the users, portfolios and bank account snapshots.
    #[arg(long, env = "INVESTWISE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Simulated bank verification latency in milliseconds.
    #[arg(long, env = "INVESTWISE_LINK_DELAY_MS", default_value_t = 2000)]
    pub link_delay_ms: u64,

    /// Secret used to sign session tokens.
    #[arg(
        long,
        env = "INVESTWISE_TOKEN_SECRET",
        default_value = "investwise-local-secret",
        hide_env_values = true
    )]
    pub token_secret: String,

    /// Minutes before a login session expires.
    #[arg(long, env = "INVESTWISE_SESSION_TTL_MINUTES", default_value_t = 60)]
    pub session_ttl_minutes: i64,

    /// Log level written to stderr.
    #[arg(long, env = "INVESTWISE_LOG", default_value_t = LevelFilter::Warn)]
    pub log_level: LevelFilter,
}

impl Settings {
    pub fn link_delay(&self) -> Duration {
        Duration::from_millis(self.link_delay_ms)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }
}
