use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use car_price_predictor::{create_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env().context("invalid configuration")?;

    let state = AppState::from_config(&cfg).with_context(|| {
        format!(
            "failed to load artifacts (model {}, features {})",
            cfg.model_path.display(),
            cfg.features_path.display()
        )
    })?;

    // Warmup so a broken artifact fails here rather than on the first request
    let warm = state.warmup().context("warmup prediction failed")?;
    tracing::info!("warmup forward ok ({:.2})", warm);
    tracing::info!(
        "reference year {}; {} makes on the form",
        state.reference_year,
        state.catalog.makes.len()
    );

    let app = create_router(Arc::new(state));

    tracing::info!("listening on {}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
