// src/main.rs
use clap::Parser;
use env_logger::Builder;
use investwise::api::Api;
use investwise::cli::Console;
use investwise::config::Settings;
use log::{error, info};
use tokio::io::{self, BufReader};
use tokio::sync::watch;

async fn run(settings: Settings) -> std::io::Result<()> {
    let api = Api::from_settings(&settings).await;
    info!(
        "Starting InvestWise with data in {}",
        settings.data_dir.display()
    );

    let (interrupt_tx, interrupt_rx) = watch::channel(());
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt_tx.send(()).is_err() {
                break;
            }
        }
    });

    let mut console = Console::new(api, BufReader::new(io::stdin()), io::stdout(), interrupt_rx);
    console.run().await
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::parse();
    Builder::new()
        .filter_level(settings.log_level)
        .format_timestamp_secs()
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(settings));
    // A stdin read may still be pending after Ctrl-C; do not wait for it.
    runtime.shutdown_background();

    if let Err(e) = &result {
        error!("Console failed: {}", e);
    }
    Ok(result?)
}
