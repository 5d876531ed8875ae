// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ads;
pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod scoring;
pub mod telemetry;
pub mod trends;
pub mod units;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::{ConfigError, PipelineError, ProviderError};
pub use crate::fallback::{FallbackReason, Fetched};
pub use crate::pipeline::{KeywordInput, KeywordRequest, Pipeline, ScoredKeyword};
pub use crate::scoring::Recommendation;

use tracing::info;

/// Build the production router: config from file/env, Prometheus recorder,
/// Google providers, and an eager credential check so a misconfigured
/// process fails here instead of on the first request.
pub fn app() -> anyhow::Result<axum::Router> {
    let cfg = config::AppConfig::load()?;
    let metrics = telemetry::Metrics::init()?;
    let state = AppState::from_config(&cfg)?.with_metrics(metrics);
    state.validate_providers()?;
    info!(
        default_region = %cfg.pipeline.default_region,
        lookback_months = cfg.pipeline.lookback_months,
        max_concurrency = cfg.pipeline.max_concurrency,
        "keyword scorer ready"
    );
    Ok(router(state))
}
