// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "SCORER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/scorer.toml";

/// Keyword-planning network breadth sent with every ideas query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordPlanNetwork {
    GoogleSearch,
    GoogleSearchAndPartners,
}

impl KeywordPlanNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordPlanNetwork::GoogleSearch => "GOOGLE_SEARCH",
            KeywordPlanNetwork::GoogleSearchAndPartners => "GOOGLE_SEARCH_AND_PARTNERS",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineSettings,
    pub trends: TrendsSettings,
    pub ads: AdsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Region used when a request carries none.
    pub default_region: String,
    /// Platform used when a request carries none (lowercased).
    pub default_platform: String,
    pub lookback_months: u32,
    /// Keywords processed concurrently within one batch.
    pub max_concurrency: usize,
    /// Per provider call.
    pub provider_timeout_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_region: "UA".to_string(),
            default_platform: "google".to_string(),
            lookback_months: 12,
            max_concurrency: 4,
            provider_timeout_ms: 10_000,
        }
    }
}

impl PipelineSettings {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsSettings {
    pub base_url: String,
    /// Interface language preference (`hl`).
    pub language: String,
    /// Timezone offset in minutes (`tz`).
    pub tz_offset_minutes: i32,
}

impl Default for TrendsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com/trends".to_string(),
            language: "en-US".to_string(),
            tz_offset_minutes: 360,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsSettings {
    pub base_url: String,
    pub api_version: String,
    pub token_url: String,
    /// Language constant id (1000 = English).
    pub language_id: u32,
    /// Geo target constant id (2804 = Ukraine).
    pub geo_target_id: u32,
    pub network: KeywordPlanNetwork,
}

impl Default for AdsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://googleads.googleapis.com".to_string(),
            api_version: "v17".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            language_id: 1000,
            geo_target_id: 2804,
            network: KeywordPlanNetwork::GoogleSearch,
        }
    }
}

impl AppConfig {
    /// Load config using env var + fallbacks, then apply env overrides:
    /// 1) $SCORER_CONFIG_PATH (must exist if set)
    /// 2) config/scorer.toml (optional)
    /// 3) built-in defaults
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides()?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scorer config from {}", path.display()))?;
        let mut cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing scorer config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        fn var(name: &str) -> Option<String> {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        fn parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
        where
            T::Err: std::fmt::Display,
        {
            match var(name) {
                Some(v) => v
                    .parse::<T>()
                    .map(Some)
                    .map_err(|e| anyhow!("invalid {name}={v}: {e}")),
                None => Ok(None),
            }
        }

        if let Some(v) = var("DEFAULT_REGION") {
            self.pipeline.default_region = v;
        }
        if let Some(v) = var("DEFAULT_PLATFORM") {
            self.pipeline.default_platform = v;
        }
        if let Some(v) = parsed::<u32>("TREND_WINDOW_MONTHS")? {
            self.pipeline.lookback_months = v;
        }
        if let Some(v) = parsed::<u64>("PROVIDER_TIMEOUT_MS")? {
            self.pipeline.provider_timeout_ms = v;
        }
        if let Some(v) = parsed::<usize>("PIPELINE_MAX_CONCURRENCY")? {
            self.pipeline.max_concurrency = v;
        }
        Ok(())
    }

    /// Replace unusable values with defaults instead of failing.
    fn sanitize(&mut self) {
        let d = PipelineSettings::default();
        let p = &mut self.pipeline;
        if p.lookback_months == 0 {
            p.lookback_months = d.lookback_months;
        }
        if p.max_concurrency == 0 {
            p.max_concurrency = 1;
        }
        if p.provider_timeout_ms == 0 {
            p.provider_timeout_ms = d.provider_timeout_ms;
        }
        p.default_platform = p.default_platform.trim().to_lowercase();
        if p.default_platform.is_empty() {
            p.default_platform = d.default_platform;
        }
        p.default_region = p.default_region.trim().to_string();
    }
}
