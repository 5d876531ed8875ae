use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::TrendsSettings;
use crate::error::{ConfigError, ProviderError};
use crate::trends::{timeframe, InterestSource};

const TIMESERIES_WIDGET: &str = "TIMESERIES";

#[derive(Debug, Deserialize)]
struct Explore {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    #[serde(default)]
    id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    request: Value,
}

#[derive(Debug, Deserialize)]
struct Multiline {
    default: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<f64>,
    #[serde(rename = "isPartial", default)]
    is_partial: bool,
}

/// Interest-over-time lookup against the Google Trends web API.
pub struct GoogleTrendsClient {
    http: reqwest::Client,
    settings: TrendsSettings,
}

impl GoogleTrendsClient {
    pub fn new(settings: TrendsSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .user_agent("keyword-opportunity-scorer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .cookie_store(true)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, settings })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        let tz = self.settings.tz_offset_minutes.to_string();
        let resp = self
            .http
            .get(url)
            .query(&[("hl", self.settings.language.as_str()), ("tz", tz.as_str())])
            .query(query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ProviderError::from_response(resp).await);
        }
        Ok(resp.text().await?)
    }
}

/// Trends answers are prefixed with an anti-JSON guard such as `)]}'`.
pub(crate) fn strip_guard(body: &str) -> Result<&str, ProviderError> {
    body.find('{')
        .map(|i| &body[i..])
        .ok_or_else(|| ProviderError::Decode("no JSON object in trends response".to_string()))
}

/// Values of complete periods, oldest first.
pub(crate) fn parse_timeline(body: &str) -> Result<Vec<f64>, ProviderError> {
    let m: Multiline = serde_json::from_str(strip_guard(body)?)?;
    Ok(m.default
        .timeline_data
        .into_iter()
        .filter(|p| !p.is_partial)
        .filter_map(|p| p.value.first().copied())
        .collect())
}

fn timeseries_widget(body: &str) -> Result<Widget, ProviderError> {
    let explore: Explore = serde_json::from_str(strip_guard(body)?)?;
    explore
        .widgets
        .into_iter()
        .find(|w| w.id == TIMESERIES_WIDGET)
        .ok_or_else(|| ProviderError::Decode("explore response has no TIMESERIES widget".into()))
}

#[async_trait]
impl InterestSource for GoogleTrendsClient {
    async fn interest_over_time(
        &self,
        keyword: &str,
        geo: &str,
        months: u32,
    ) -> Result<Vec<f64>, ProviderError> {
        let req = json!({
            "comparisonItem": [{ "keyword": keyword, "geo": geo, "time": timeframe(months) }],
            "category": 0,
            "property": "",
        });
        let req = serde_json::to_string(&req)?;
        let explore = self.get_json("api/explore", &[("req", req.as_str())]).await?;
        let widget = timeseries_widget(&explore)?;

        let widget_req = serde_json::to_string(&widget.request)?;
        let body = self
            .get_json(
                "api/widgetdata/multiline",
                &[("req", widget_req.as_str()), ("token", widget.token.as_str())],
            )
            .await?;
        let series = parse_timeline(&body)?;
        tracing::debug!(keyword, geo, months, points = series.len(), "trends series fetched");
        Ok(series)
    }

    fn name(&self) -> &'static str {
        "google_trends"
    }
}
