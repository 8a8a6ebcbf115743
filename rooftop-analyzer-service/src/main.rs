mod config;
mod service;

use anyhow::Context;
use config::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "rooftop_analyzer_service=debug,solar_analysis=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // The upstream credential is a fatal startup condition: nothing is
    // served without it.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let app = service::create_app(&config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context("failed to bind listener")?;
    let addr = listener.local_addr()?;

    info!("Solar Rooftop Analyzer running on http://{}", addr);
    info!(model = %config.model, "upstream analysis model");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
