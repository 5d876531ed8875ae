// tests/common/mod.rs
//
// Stub provider sources shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use keyword_opportunity_scorer::ads::{IdeaMetrics, KeywordIdea, KeywordIdeasSource};
use keyword_opportunity_scorer::config::AppConfig;
use keyword_opportunity_scorer::trends::InterestSource;
use keyword_opportunity_scorer::{AppState, ConfigError, ProviderError};

/// Series with mean 62 and slope exactly 2: trend score 7.2, rising.
pub fn rising_series() -> Vec<f64> {
    (0..12).map(|i| 51.0 + 2.0 * i as f64).collect()
}

pub fn idea(text: &str, volume: i64, level: &str, micros: i64) -> KeywordIdea {
    KeywordIdea {
        text: text.to_string(),
        metrics: Some(IdeaMetrics {
            avg_monthly_searches: Some(volume),
            competition: Some(level.to_string()),
            high_top_of_page_bid_micros: Some(micros),
        }),
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    Ok,
    Fail,
    Hang,
    Misconfigured,
    /// Credentials are fine but no customer id names the target account.
    MissingAccount,
}

/// Keyword → series. Unknown keywords get an empty series.
pub struct StubTrends {
    pub series: HashMap<String, Vec<f64>>,
    pub behavior: Behavior,
    pub calls: AtomicUsize,
}

impl StubTrends {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            series: HashMap::new(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, keyword: &str, series: Vec<f64>) -> Self {
        self.series.insert(keyword.to_string(), series);
        self
    }
}

#[async_trait]
impl InterestSource for StubTrends {
    async fn interest_over_time(
        &self,
        keyword: &str,
        _geo: &str,
        _months: u32,
    ) -> Result<Vec<f64>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Ok => Ok(self.series.get(keyword).cloned().unwrap_or_default()),
            Behavior::Fail | Behavior::Misconfigured | Behavior::MissingAccount => {
                Err(ProviderError::Status {
                    status: 429,
                    body: "too many requests".into(),
                })
            }
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub_trends"
    }
}

/// Keyword → ideas. Unknown keywords get no ideas.
pub struct StubIdeas {
    pub ideas: HashMap<String, Vec<KeywordIdea>>,
    pub behavior: Behavior,
    pub calls: AtomicUsize,
}

impl StubIdeas {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            ideas: HashMap::new(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, keyword: &str, ideas: Vec<KeywordIdea>) -> Self {
        self.ideas.insert(keyword.to_string(), ideas);
        self
    }
}

#[async_trait]
impl KeywordIdeasSource for StubIdeas {
    async fn keyword_ideas(
        &self,
        keyword: &str,
        _region: &str,
    ) -> Result<Vec<KeywordIdea>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Ok => Ok(self.ideas.get(keyword).cloned().unwrap_or_default()),
            Behavior::Fail => Err(ProviderError::Decode("unexpected payload".into())),
            Behavior::Misconfigured => Err(ConfigError::Missing("GOOGLE_ADS_DEVELOPER_TOKEN").into()),
            Behavior::MissingAccount => Err(ProviderError::MissingAccount(
                "GOOGLE_ADS_CUSTOMER_ID is not set".into(),
            )),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub_ideas"
    }
}

/// Both stubs knowing "ginger tea" and "gaba tea".
pub fn tea_sources() -> (Arc<StubIdeas>, Arc<StubTrends>) {
    let ideas = StubIdeas::new(Behavior::Ok)
        .with(
            "ginger tea",
            vec![
                idea("ginger tea benefits", 880, "LOW", 150_000),
                idea("ginger tea", 6600, "MEDIUM", 270_000),
            ],
        )
        .with("gaba tea", vec![idea("gaba tea", 8100, "LOW", 420_000)]);
    let trends = StubTrends::new(Behavior::Ok)
        .with("ginger tea", rising_series())
        .with("gaba tea", vec![80.0; 12]);
    (Arc::new(ideas), Arc::new(trends))
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.pipeline.provider_timeout_ms = 200;
    cfg
}

pub fn state_with(ideas: Arc<StubIdeas>, trends: Arc<StubTrends>) -> AppState {
    AppState::with_sources(&test_config(), ideas, trends)
}
