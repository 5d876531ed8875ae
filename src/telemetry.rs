use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::fallback::FallbackReason;

const DEFAULT_LOG_FILTER: &str = "keyword_opportunity_scorer=info,tower_http=info,warn";

/// Install the tracing subscriber. `LOG_FORMAT=json` switches to JSON lines.
/// No-op when a subscriber is already installed (e.g. by the host runtime).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "provider_calls_total",
            "Provider calls by provider and outcome (live or fallback)."
        );
        describe_counter!(
            "provider_fallback_total",
            "Provider calls answered with the documented fallback, by reason."
        );
        describe_counter!("keywords_scored_total", "Keywords that produced a record.");
        describe_counter!("keywords_skipped_total", "Blank keyword entries skipped.");
        describe_histogram!("batch_duration_ms", "Wall time of one scoring batch in milliseconds.");
    });
}

pub fn record_provider_outcome(provider: &'static str, fallback: Option<FallbackReason>) {
    ensure_metrics_described();
    match fallback {
        None => counter!("provider_calls_total", "provider" => provider, "outcome" => "live")
            .increment(1),
        Some(reason) => {
            counter!("provider_calls_total", "provider" => provider, "outcome" => "fallback")
                .increment(1);
            counter!("provider_fallback_total", "provider" => provider, "reason" => reason.as_str())
                .increment(1);
        }
    }
}

pub fn record_batch(scored: usize, skipped: usize, elapsed_ms: f64) {
    ensure_metrics_described();
    counter!("keywords_scored_total").increment(scored as u64);
    counter!("keywords_skipped_total").increment(skipped as u64);
    metrics::histogram!("batch_duration_ms").record(elapsed_ms);
}

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> anyhow::Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
            .context("prometheus: install recorder")?
            .clone();
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
