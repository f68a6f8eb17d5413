use std::sync::Arc;

use arc_swap::ArcSwap;
use gitframe_common::{error::Result, serve, state::Config};
use scorched::{logf, LogData, LogImportance};
use tokio::signal;

const APP_NAME: &str = "gitframe";

/// Path override for the configuration file. Without it confy's per-user location is used.
const CONFIG_ENV: &str = "GITFRAME_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Arc::new(ArcSwap::from_pointee(load_config()?));

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(config.clone()));

    serve(config, shutdown_signal()).await?;

    Ok(())
}

fn load_config() -> Result<Config> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            logf!(
                Info,
                "Loading config from file: {}",
                std::path::Path::new(&path).display()
            );
            Ok(confy::load_path(path)?)
        }
        None => {
            logf!(
                Info,
                "Loading config from file: {}",
                confy::get_configuration_file_path(APP_NAME, None)?.display()
            );
            Ok(confy::load(APP_NAME, None)?)
        }
    }
}

/// Re-reads the configuration on SIGHUP. A file that fails to load keeps the old config.
#[cfg(unix)]
async fn reload_on_hangup(config: Arc<ArcSwap<Config>>) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            logf!(Error, "Failed to install SIGHUP handler: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        match load_config() {
            Ok(new_config) => {
                for warning in gitframe_common::state::validate_config(&new_config) {
                    logf!(Warning, "Configuration: {}", warning);
                }
                config.store(Arc::new(new_config));
                logf!(Info, "Configuration reloaded");
            }
            Err(e) => {
                logf!(Error, "Failed to reload configuration: {}", e);
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
