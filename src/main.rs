use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use lv_stock_watcher::alerts::AlertManager;
use lv_stock_watcher::utils::error::{ConfigurationError, RUNTIME_EXIT_CODE};
use lv_stock_watcher::utils::logging;
use lv_stock_watcher::view::StatusHeader;
use lv_stock_watcher::{AppConfig, AvailabilityClient, CliArgs, StockMonitor};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = CliArgs::parse();

    let config = match AppConfig::load(&cli).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with_config_error(e),
    };
    let country = match config.country() {
        Ok(country) => country,
        Err(e) => exit_with_config_error(e),
    };

    let _log_guard = logging::init(&config.logging);
    info!("Starting Louis Vuitton stock watcher for {} ({})", country.code(), country.locale());

    let prober = match AvailabilityClient::new(&config.probe, &country) {
        Ok(prober) => prober,
        Err(e) => {
            eprintln!("Error: unable to build HTTP client: {e}");
            std::process::exit(RUNTIME_EXIT_CODE);
        }
    };
    let alerts = AlertManager::from_config(&config.alerts);
    info!("Alert sinks: {:?}", alerts.sink_names());

    let scheduler_config = config.scheduler();
    let mut monitor = StockMonitor::new(scheduler_config.clone(), Arc::new(prober), alerts);
    if scheduler_config.status_table {
        monitor = monitor.with_status_table(StatusHeader {
            region: country.locale().to_string(),
            product_file: scheduler_config.watchlist_path.display().to_string(),
            check_interval: scheduler_config.probe_interval,
        });
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    if let Err(e) = monitor.run(shutdown).await {
        eprintln!("Error: {e}");
        std::process::exit(RUNTIME_EXIT_CODE);
    }

    info!("Shutting down...");
    Ok(())
}

fn exit_with_config_error(e: ConfigurationError) -> ! {
    eprintln!("Error: {e}");
    eprintln!("Run with --help for usage.");
    std::process::exit(e.exit_code());
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Unable to listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    shutdown.cancel();
}
