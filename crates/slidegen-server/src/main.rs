use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use slidegen::logging::init_tracing;
use slidegen::{load_config_or_default, SlideService};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Optional config path as the only argument.
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config =
        load_config_or_default(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    let service = Arc::new(
        SlideService::from_config(&config)
            .await
            .context("Failed to start slide service")?,
    );

    let mut events = service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(
                    job_id = %event.job_id,
                    status = %event.status,
                    progress = event.progress,
                    "Job progress"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Progress log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!(version = env!("CARGO_PKG_VERSION"), "slidegen-server starting");

    let router = slidegen_server::build_router(service, &config.server);
    slidegen_server::serve(router, &config.server).await
}
