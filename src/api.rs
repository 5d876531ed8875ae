use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ads::{ClientCache, GoogleAdsIdeasSource, KeywordIdeasSource, MetricsProvider};
use crate::config::AppConfig;
use crate::error::{ConfigError, PipelineError};
use crate::pipeline::{KeywordInput, Pipeline, ScoredKeyword};
use crate::telemetry::Metrics;
use crate::trends::{google::GoogleTrendsClient, InterestSource, TrendProvider};

#[derive(Clone)]
pub struct AppState {
    pipeline: Pipeline,
    /// Present when the metrics source goes through the cached ads client.
    ads_cache: Option<Arc<ClientCache>>,
    metrics: Option<Metrics>,
}

impl AppState {
    /// Production wiring: Google Trends + Google Ads with env credentials.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        let trends: Arc<dyn InterestSource> =
            Arc::new(GoogleTrendsClient::new(cfg.trends.clone())?);
        let cache = Arc::new(ClientCache::from_env(cfg.ads.clone()));
        let ideas: Arc<dyn KeywordIdeasSource> = Arc::new(GoogleAdsIdeasSource::new(cache.clone()));
        let mut state = Self::with_sources(cfg, ideas, trends);
        state.ads_cache = Some(cache);
        Ok(state)
    }

    /// Wiring with arbitrary sources (tests, local stubs).
    pub fn with_sources(
        cfg: &AppConfig,
        ideas: Arc<dyn KeywordIdeasSource>,
        trends: Arc<dyn InterestSource>,
    ) -> Self {
        let timeout = cfg.pipeline.provider_timeout();
        let pipeline = Pipeline::new(
            MetricsProvider::new(ideas, timeout),
            TrendProvider::new(trends, timeout),
            cfg.pipeline.clone(),
        );
        Self {
            pipeline,
            ads_cache: None,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the ads client now so bad credentials fail at startup.
    pub fn validate_providers(&self) -> Result<(), ConfigError> {
        if let Some(cache) = &self.ads_cache {
            cache.get()?;
        }
        Ok(())
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

pub fn router(state: AppState) -> Router {
    let metrics_routes = state
        .metrics
        .as_ref()
        .map(|m| m.router::<()>())
        .unwrap_or_default();

    Router::new()
        .route("/", get(home))
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .with_state(state)
        .merge(metrics_routes)
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

async fn home() -> &'static str {
    "Server is up ✅"
}

#[derive(Debug, serde::Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    keywords: Vec<KeywordInput>,
    #[serde(default)]
    config: AnalyzeConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
struct AnalyzeConfig {
    /// Number or numeric string.
    #[serde(rename = "TREND_WINDOW_MONTHS", alias = "lookback_months", default)]
    trend_window_months: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
struct AnalyzeResp {
    results: Vec<ScoredKeyword>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Pipeline(PipelineError),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Pipeline(e) => {
                tracing::error!(error = %e, "batch failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// Missing or non-positive → 0 (pipeline default). Anything that is not a
/// whole number of months fitting `u32` → 400.
fn lookback_months(v: Option<&Value>) -> Result<u32, ApiError> {
    let bad = || {
        ApiError::BadRequest("TREND_WINDOW_MONTHS must be a whole number of months".to_string())
    };
    let n = match v {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => f as i64,
            _ => return Err(bad()),
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| bad())?,
        Some(_) => return Err(bad()),
    };
    if n <= 0 {
        return Ok(0);
    }
    u32::try_from(n).map_err(|_| bad())
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<AnalyzeResp>, ApiError> {
    let months = lookback_months(body.config.trend_window_months.as_ref())?;
    let results = state.pipeline.score_batch(&body.keywords, months).await?;
    Ok(Json(AnalyzeResp { results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_accepts_numbers_and_numeric_strings() {
        assert_eq!(lookback_months(None).unwrap(), 0);
        assert_eq!(lookback_months(Some(&json!(null))).unwrap(), 0);
        assert_eq!(lookback_months(Some(&json!(6))).unwrap(), 6);
        assert_eq!(lookback_months(Some(&json!("24"))).unwrap(), 24);
        assert_eq!(lookback_months(Some(&json!(6.0))).unwrap(), 6);
        assert_eq!(lookback_months(Some(&json!(-4))).unwrap(), 0);
        assert_eq!(lookback_months(Some(&json!("-4"))).unwrap(), 0);
        assert!(lookback_months(Some(&json!("a year"))).is_err());
        assert!(lookback_months(Some(&json!([12]))).is_err());
    }

    #[test]
    fn lookback_rejects_fractions_and_out_of_range() {
        assert!(lookback_months(Some(&json!(3.7))).is_err());
        assert!(lookback_months(Some(&json!("3.7"))).is_err());
        assert!(lookback_months(Some(&json!(5e9))).is_err());
        assert!(lookback_months(Some(&json!("9999999999"))).is_err());
        assert!(lookback_months(Some(&json!(u64::MAX))).is_err());
        assert!(lookback_months(Some(&json!(1e300))).is_err());
    }
}
