use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use citasalud::api;
use citasalud::config::{self, Config};
use citasalud::core_state::CoreState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(data_dir = %config.data_dir.display(), bind = %config.bind, "starting");

    let core = CoreState::new(&config);
    core.ensure_dirs()?;
    // Run migrations once up front so a broken schema fails fast instead
    // of on the first request.
    core.open_db()?;

    let server = api::start_server(Arc::new(core), config.bind).await?;
    tracing::info!(addr = %server.addr, "listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown().await;
    Ok(())
}
