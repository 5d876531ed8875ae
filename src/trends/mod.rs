//! # Trend Signal Provider
//! Turns an interest-over-time series into a 0–10 trend score and a
//! direction. The score adds level (series mean / 10) and bounded momentum
//! (least-squares slope clamped to ±2, halved), so momentum moves a keyword
//! by at most one point.
//!
//! `TrendProvider::fetch` is total: remote failures, timeouts and thin
//! series all yield `(5.0, stable)`.

pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderError;
use crate::fallback::{FallbackReason, Fetched};
use crate::units::round1;

pub const MIN_OBSERVATIONS: usize = 10;
pub const MIN_MEAN_INTEREST: f64 = 2.0;
const SLOPE_CLAMP: f64 = 2.0;
const DIRECTION_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub score_0_10: f64,
    pub direction: TrendDirection,
}

impl TrendSignal {
    /// Neither boosts nor penalizes a keyword.
    pub const NEUTRAL: TrendSignal = TrendSignal {
        score_0_10: 5.0,
        direction: TrendDirection::Stable,
    };
}

/// Remote lookup of interest-over-time values on a 0–100 scale, oldest first.
#[async_trait]
pub trait InterestSource: Send + Sync {
    async fn interest_over_time(
        &self,
        keyword: &str,
        geo: &str,
        months: u32,
    ) -> Result<Vec<f64>, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Region code to trends geo: exactly two ASCII letters, else global.
pub fn geo_for_region(region: &str) -> String {
    let r = region.trim();
    if r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()) {
        r.to_ascii_uppercase()
    } else {
        String::new()
    }
}

pub fn timeframe(months: u32) -> String {
    format!("today {months}-m")
}

/// Arithmetic mean and least-squares slope over sample index.
/// `None` for an empty series.
pub fn mean_and_slope(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    if n == 1 {
        return Some((mean, 0.0));
    }
    let x_mean = (nf - 1.0) / 2.0;
    let (mut cov, mut var) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        cov += dx * (y - mean);
        var += dx * dx;
    }
    Some((mean, cov / var))
}

/// Signal for a series, or `None` when it is too short or too quiet.
pub fn signal_from_series(values: &[f64]) -> Option<TrendSignal> {
    if values.len() < MIN_OBSERVATIONS {
        return None;
    }
    let (mean, slope) = mean_and_slope(values)?;
    if !mean.is_finite() || !slope.is_finite() || mean < MIN_MEAN_INTEREST {
        return None;
    }

    let mean_score = mean / 10.0;
    let slope_norm = slope.clamp(-SLOPE_CLAMP, SLOPE_CLAMP) / SLOPE_CLAMP;
    let score_0_10 = round1((mean_score + slope_norm).clamp(0.0, 10.0));

    let direction = if slope > DIRECTION_THRESHOLD {
        TrendDirection::Rising
    } else if slope < -DIRECTION_THRESHOLD {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    Some(TrendSignal {
        score_0_10,
        direction,
    })
}

#[derive(Clone)]
pub struct TrendProvider {
    source: Arc<dyn InterestSource>,
    timeout: Duration,
}

impl TrendProvider {
    pub fn new(source: Arc<dyn InterestSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn fetch(&self, keyword: &str, region: &str, months: u32) -> Fetched<TrendSignal> {
        let geo = geo_for_region(region);
        let provider = self.source.name();
        let call = self.source.interest_over_time(keyword, &geo, months);

        let fetched = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                tracing::warn!(provider, keyword, geo = %geo, "trend lookup timed out");
                fallback(FallbackReason::Timeout)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, provider, keyword, geo = %geo, "trend lookup failed");
                fallback(FallbackReason::ProviderError)
            }
            Ok(Ok(series)) => match signal_from_series(&series) {
                Some(sig) => Fetched::Live(sig),
                None => {
                    tracing::debug!(provider, keyword, points = series.len(), "trend series too thin");
                    fallback(FallbackReason::InsufficientData)
                }
            },
        };

        crate::telemetry::record_provider_outcome("trends", fetched.fallback_reason());
        fetched
    }
}

fn fallback(reason: FallbackReason) -> Fetched<TrendSignal> {
    Fetched::Fallback {
        value: TrendSignal::NEUTRAL,
        reason,
    }
}
