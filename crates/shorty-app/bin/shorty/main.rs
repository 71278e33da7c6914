use clap::Parser;
use shorty_app::telemetry::init_tracing;
use shorty_app::{App, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::try_parse()?;
    init_tracing(config.log_format)?;

    info!(
        storage_backend = %config.storage_backend(),
        generator = ?config.generator,
        worker_concurrency = config.background_worker_concurrency,
        "starting shorty"
    );

    let app = App::new(&config).await?;
    app.store().ping().await?;
    info!("storage is reachable, waiting for shutdown signal");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    app.close().await?;
    Ok(())
}
