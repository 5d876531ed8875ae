//! # Pipeline Orchestrator
//! Scores a batch of keyword requests: trims and skips blanks, fills
//! defaults, fetches metrics and trend concurrently per keyword, scores, and
//! returns one record per non-blank keyword in input order.
//!
//! Keywords of a batch run on a worker pool bounded by `max_concurrency`.
//! Providers are total, so the only failure is a configuration error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::ads::{MetricsProvider, RawMetrics};
use crate::config::PipelineSettings;
use crate::error::{ConfigError, PipelineError};
use crate::scoring::{potential_score, recommend, Recommendation, ScoreInputs};
use crate::trends::{TrendDirection, TrendProvider, TrendSignal};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One inbound entry as the caller sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordInput {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl KeywordInput {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: Some(keyword.to_string()),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

/// A validated request. Built only for non-blank keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRequest {
    pub keyword: String,
    pub region: String,
    pub platform: String,
    pub lookback_months: u32,
}

impl KeywordRequest {
    /// `None` for a blank keyword. An absent region takes the default; an
    /// empty one stays empty (global scope).
    pub fn from_input(
        input: &KeywordInput,
        settings: &PipelineSettings,
        lookback_months: u32,
    ) -> Option<Self> {
        let keyword = input.keyword.as_deref().unwrap_or("").trim();
        if keyword.is_empty() {
            return None;
        }
        let region = match &input.region {
            Some(r) => r.trim().to_string(),
            None => settings.default_region.clone(),
        };
        let platform = input
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(settings.default_platform.as_str())
            .to_lowercase();
        Some(Self {
            keyword: keyword.to_string(),
            region,
            platform,
            lookback_months: if lookback_months == 0 {
                settings.lookback_months
            } else {
                lookback_months
            },
        })
    }
}

/// The output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredKeyword {
    pub keyword: String,
    pub region: String,
    pub platform: String,
    pub volume_monthly: u64,
    pub kd: u8,
    pub cpc_usd: f64,
    pub trend_score_0_10: f64,
    pub trend_direction: TrendDirection,
    pub competition_0_100: u8,
    pub potential_score_0_10: f64,
    pub recommendation: Recommendation,
    pub updated_at: String,
}

impl ScoredKeyword {
    pub fn build(
        req: &KeywordRequest,
        metrics: &RawMetrics,
        trend: &TrendSignal,
        updated_at: &str,
    ) -> Self {
        let inputs = ScoreInputs::new(
            metrics.volume_monthly,
            metrics.difficulty_0_100 as i64,
            trend.score_0_10,
            metrics.competition_0_100 as i64,
        );
        let potential = potential_score(&inputs);
        Self {
            keyword: req.keyword.clone(),
            region: req.region.clone(),
            platform: req.platform.clone(),
            volume_monthly: metrics.volume_monthly,
            kd: metrics.difficulty_0_100,
            cpc_usd: metrics.cpc_usd,
            trend_score_0_10: inputs.trend_score,
            trend_direction: trend.direction,
            competition_0_100: metrics.competition_0_100,
            potential_score_0_10: potential,
            recommendation: recommend(potential),
            updated_at: updated_at.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    metrics: MetricsProvider,
    trends: TrendProvider,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(metrics: MetricsProvider, trends: TrendProvider, settings: PipelineSettings) -> Self {
        Self {
            metrics,
            trends,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Validate inputs into requests, dropping blank keywords.
    pub fn requests(&self, inputs: &[KeywordInput], lookback_months: u32) -> Vec<KeywordRequest> {
        inputs
            .iter()
            .filter_map(|i| KeywordRequest::from_input(i, &self.settings, lookback_months))
            .collect()
    }

    /// Score one request. Metrics and trend are fetched concurrently.
    pub async fn score_one(
        &self,
        req: &KeywordRequest,
        updated_at: &str,
    ) -> Result<ScoredKeyword, ConfigError> {
        let (metrics, trend) = tokio::join!(
            self.metrics.fetch(&req.keyword, &req.region),
            self.trends.fetch(&req.keyword, &req.region, req.lookback_months),
        );
        let metrics = metrics?;
        let rec = ScoredKeyword::build(req, metrics.value(), trend.value(), updated_at);
        tracing::debug!(
            keyword = %rec.keyword,
            potential = rec.potential_score_0_10,
            recommendation = %rec.recommendation,
            metrics_fallback = ?metrics.fallback_reason(),
            trend_fallback = ?trend.fallback_reason(),
            "keyword scored"
        );
        Ok(rec)
    }

    /// Score a batch; `lookback_months == 0` means the configured default.
    pub async fn score_batch(
        &self,
        inputs: &[KeywordInput],
        lookback_months: u32,
    ) -> Result<Vec<ScoredKeyword>, PipelineError> {
        let t0 = Instant::now();
        let requests = self.requests(inputs, lookback_months);
        let skipped = inputs.len() - requests.len();
        let updated_at = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let updated_at: Arc<str> = Arc::from(updated_at);

        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut set = JoinSet::new();
        for (idx, req) in requests.into_iter().enumerate() {
            let this = self.clone();
            let permits = permits.clone();
            let updated_at = updated_at.clone();
            set.spawn(async move {
                // the semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                (idx, this.score_one(&req, &updated_at).await)
            });
        }

        let mut slots: Vec<Option<ScoredKeyword>> = vec![None; set.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(rec))) => slots[idx] = Some(rec),
                Ok((_, Err(e))) => {
                    set.abort_all();
                    return Err(e.into());
                }
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => return Err(PipelineError::Worker(e.to_string())),
            }
        }
        let out: Vec<ScoredKeyword> = slots.into_iter().flatten().collect();

        let elapsed_ms = t0.elapsed().as_secs_f64() * 1_000.0;
        crate::telemetry::record_batch(out.len(), skipped, elapsed_ms);
        tracing::info!(
            scored = out.len(),
            skipped,
            elapsed_ms,
            "keyword batch scored"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PipelineSettings {
        PipelineSettings::default()
    }

    #[test]
    fn blank_keywords_are_skipped() {
        for kw in [None, Some(""), Some("   "), Some("\t\n")] {
            let input = KeywordInput {
                keyword: kw.map(String::from),
                ..KeywordInput::default()
            };
            assert!(KeywordRequest::from_input(&input, &settings(), 12).is_none());
        }
    }

    #[test]
    fn defaults_fill_absent_fields_only() {
        let req = KeywordRequest::from_input(&KeywordInput::new("  gaba tea "), &settings(), 0).unwrap();
        assert_eq!(req.keyword, "gaba tea");
        assert_eq!(req.region, "UA");
        assert_eq!(req.platform, "google");
        assert_eq!(req.lookback_months, 12);

        let input = KeywordInput {
            keyword: Some("oolong".into()),
            region: Some("".into()),
            platform: Some(" Amazon ".into()),
        };
        let req = KeywordRequest::from_input(&input, &settings(), 6).unwrap();
        assert_eq!(req.region, "");
        assert_eq!(req.platform, "amazon");
        assert_eq!(req.lookback_months, 6);

        let input = KeywordInput {
            platform: Some("  ".into()),
            ..KeywordInput::new("x")
        };
        let req = KeywordRequest::from_input(&input, &settings(), 12).unwrap();
        assert_eq!(req.platform, "google");
    }

    #[test]
    fn record_carries_kd_and_score() {
        let req = KeywordRequest::from_input(
            &KeywordInput::new("ginger tea").with_region("UA"),
            &settings(),
            12,
        )
        .unwrap();
        let metrics = RawMetrics {
            volume_monthly: 6600,
            difficulty_0_100: 35,
            cpc_usd: 0.27,
            competition_0_100: 41,
        };
        let trend = TrendSignal {
            score_0_10: 7.2,
            direction: TrendDirection::Rising,
        };
        let rec = ScoredKeyword::build(&req, &metrics, &trend, "2025-01-01 00:00:00 UTC");
        assert_eq!(rec.kd, 35);
        assert_eq!(rec.potential_score_0_10, 8.2);
        assert_eq!(rec.recommendation, Recommendation::Test);

        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["trend_direction"], "rising");
        assert_eq!(v["recommendation"], "test");
        assert_eq!(v["cpc_usd"], 0.27);
    }
}
