//! Credibility adapter — Binary Entrypoint
//! Boots the Axum HTTP server with the Twitter-backed scoring engine.

use std::sync::Arc;

use retweet_credibility::config::CredibilityConfig;
use retweet_credibility::ingest::providers::twitter::TwitterProvider;
use retweet_credibility::metrics::Metrics;
use retweet_credibility::{api, CredibilityEngine};
use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - CREDIBILITY_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("CREDIBILITY_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("credibility=debug,info"));

    // The runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = CredibilityConfig::load()?;
    info!(
        concurrency = cfg.scoring.concurrency,
        max_results = cfg.twitter.max_results,
        api_host = %cfg.twitter.api_host,
        "credibility config loaded"
    );

    let provider = Arc::new(TwitterProvider::from_config(&cfg.twitter)?);
    let engine = CredibilityEngine::from_provider(provider, cfg.scoring.options());

    let metrics = Metrics::init()?;
    let router = api::router(api::AppState::new(engine)).merge(metrics.router());

    Ok(router.into())
}
