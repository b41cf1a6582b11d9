//! Wait Time Predictor - HTTP prediction service
//!
//! Serves wait time predictions from a regression model that is loaded from
//! disk, or trained on synthetic queue data when none exists yet.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use waittime_lib::{PeopleCounter, PredictorMetrics, StructuredLogger, WaitTimePredictor};
use waittime_server::{api, config::ServerConfig, counter::RemotePeopleCounter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting wait-time-predictor");

    let config = ServerConfig::load()?;
    let predictor_config = config.predictor_config()?;
    info!(
        port = config.api_port,
        data_path = %config.data_path.display(),
        model_path = %config.model_path.display(),
        warm_start = config.warm_start,
        "Service configured"
    );

    let metrics = PredictorMetrics::new();
    let logger = StructuredLogger::new(&config.service_name);
    logger.log_startup(SERVICE_VERSION, &config.model_path.display().to_string());

    let people_counter: Option<Arc<dyn PeopleCounter>> = match &config.people_counter_url {
        Some(url) => {
            let counter = RemotePeopleCounter::new(url.as_str())
                .context("Failed to set up people counter")?;
            info!(url = %counter.url(), "Image predictions enabled");
            Some(Arc::new(counter))
        }
        None => {
            info!("No people counter configured, image predictions disabled");
            None
        }
    };

    let predictor = Arc::new(WaitTimePredictor::new(predictor_config));

    // Warm up in the background so the port opens immediately. A failure here
    // is retried lazily by the first prediction.
    if config.warm_start {
        let predictor = Arc::clone(&predictor);
        tokio::spawn(async move {
            if let Err(e) = predictor.warm_up().await {
                warn!(error = %e, kind = e.kind(), "Warm-up failed, will load on first request");
            }
        });
    }

    let app_state = Arc::new(api::AppState::new(predictor, people_counter, metrics));

    api::serve(config.api_port, app_state, shutdown_signal()).await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
