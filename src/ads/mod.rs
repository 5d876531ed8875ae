//! # Metrics Provider
//! Monthly volume, competition and CPC for a keyword, taken from the best
//! candidate of a keyword-ideas query.
//!
//! `MetricsProvider::fetch` only fails with a `ConfigError` (the client
//! cannot be built at all). Every per-call problem becomes the all-zero
//! fallback. Difficulty (`kd`) is the competition percentage: there is no
//! independent difficulty signal.

pub mod cache;
pub mod client;
pub mod credentials;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, ProviderError};
use crate::fallback::{FallbackReason, Fetched};
use crate::units::{competition_level_to_percent, micros_to_usd};

pub use cache::ClientCache;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawMetrics {
    pub volume_monthly: u64,
    pub difficulty_0_100: u8,
    pub cpc_usd: f64,
    pub competition_0_100: u8,
}

impl RawMetrics {
    pub const ZERO: RawMetrics = RawMetrics {
        volume_monthly: 0,
        difficulty_0_100: 0,
        cpc_usd: 0.0,
        competition_0_100: 0,
    };
}

/// One candidate returned by a keyword-ideas query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeywordIdea {
    pub text: String,
    pub metrics: Option<IdeaMetrics>,
}

/// Provider-native metrics of an idea.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdeaMetrics {
    pub avg_monthly_searches: Option<i64>,
    /// e.g. `"LOW"`, `"MEDIUM"`, `"HIGH"`
    pub competition: Option<String>,
    pub high_top_of_page_bid_micros: Option<i64>,
}

#[async_trait]
pub trait KeywordIdeasSource: Send + Sync {
    async fn keyword_ideas(
        &self,
        keyword: &str,
        region: &str,
    ) -> Result<Vec<KeywordIdea>, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Highest average monthly searches among ideas with metrics; first wins on ties.
pub fn select_best_idea(ideas: &[KeywordIdea]) -> Option<&IdeaMetrics> {
    ideas
        .iter()
        .filter_map(|idea| idea.metrics.as_ref())
        .fold(None, |best: Option<&IdeaMetrics>, m| match best {
            Some(b) if volume_of(b) >= volume_of(m) => Some(b),
            _ => Some(m),
        })
}

fn volume_of(m: &IdeaMetrics) -> i64 {
    m.avg_monthly_searches.unwrap_or(0).max(0)
}

pub fn metrics_from_idea(m: &IdeaMetrics) -> RawMetrics {
    // proto3 JSON omits the default enum value, so absent means UNSPECIFIED
    let level = m.competition.as_deref().unwrap_or("UNSPECIFIED");
    let competition = competition_level_to_percent(level);
    RawMetrics {
        volume_monthly: volume_of(m) as u64,
        difficulty_0_100: competition,
        cpc_usd: micros_to_usd(m.high_top_of_page_bid_micros),
        competition_0_100: competition,
    }
}

/// Keyword ideas through the cached Google Ads client.
pub struct GoogleAdsIdeasSource {
    cache: Arc<ClientCache>,
}

impl GoogleAdsIdeasSource {
    pub fn new(cache: Arc<ClientCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl KeywordIdeasSource for GoogleAdsIdeasSource {
    async fn keyword_ideas(
        &self,
        keyword: &str,
        region: &str,
    ) -> Result<Vec<KeywordIdea>, ProviderError> {
        let client = self.cache.get()?;
        // geo/language are fixed by configuration; the region is only logged
        tracing::debug!(keyword, region, "keyword ideas query");
        client.generate_keyword_ideas(keyword).await
    }

    fn name(&self) -> &'static str {
        "google_ads"
    }
}

#[derive(Clone)]
pub struct MetricsProvider {
    source: Arc<dyn KeywordIdeasSource>,
    timeout: Duration,
}

impl MetricsProvider {
    pub fn new(source: Arc<dyn KeywordIdeasSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn fetch(
        &self,
        keyword: &str,
        region: &str,
    ) -> Result<Fetched<RawMetrics>, ConfigError> {
        let provider = self.source.name();
        let call = self.source.keyword_ideas(keyword, region);

        let fetched = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                tracing::warn!(provider, keyword, "keyword ideas timed out");
                fallback(FallbackReason::Timeout)
            }
            Ok(Err(ProviderError::Config(e))) => {
                tracing::error!(error = %e, provider, "ads client misconfigured");
                return Err(e);
            }
            Ok(Err(ProviderError::MissingAccount(why))) => {
                tracing::warn!(provider, keyword, reason = %why, "no target account");
                fallback(FallbackReason::MissingAccount)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, provider, keyword, "keyword ideas failed");
                fallback(FallbackReason::ProviderError)
            }
            Ok(Ok(ideas)) => match select_best_idea(&ideas) {
                Some(best) => Fetched::Live(metrics_from_idea(best)),
                None => {
                    tracing::debug!(provider, keyword, ideas = ideas.len(), "no idea carried metrics");
                    fallback(FallbackReason::NoMetrics)
                }
            },
        };

        crate::telemetry::record_provider_outcome("metrics", fetched.fallback_reason());
        Ok(fetched)
    }
}

fn fallback(reason: FallbackReason) -> Fetched<RawMetrics> {
    Fetched::Fallback {
        value: RawMetrics::ZERO,
        reason,
    }
}
