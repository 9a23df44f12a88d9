use anyhow::{Context, Result};

use surfe_diem::config::Config;
use surfe_diem::metrics;
use surfe_diem::server::SurfServer;

/// Start the HTTP API
pub async fn serve(config: Config) -> Result<()> {
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics registry unavailable");
    }

    let server = SurfServer::from_config(config)
        .await
        .context("Failed to create server")?;

    println!("Starting surfe-diem API");
    println!("=======================");
    println!("{}", server.info().display());
    println!();
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Server stopped.");
    Ok(())
}
