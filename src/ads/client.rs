//! Google Ads REST client for keyword ideas.
//!
//! Credentials and settings are fixed at construction. The only interior
//! state is the short-lived OAuth access token minted from the refresh token.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::ads::credentials::Credentials;
use crate::ads::{IdeaMetrics, KeywordIdea};
use crate::config::AdsSettings;
use crate::error::{ConfigError, ProviderError};

/// Refresh the access token this long before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

pub struct AdsClient {
    http: reqwest::Client,
    creds: Credentials,
    settings: AdsSettings,
    token: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for AdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdsClient")
            .field("creds", &self.creds)
            .field("api_version", &self.settings.api_version)
            .finish()
    }
}

impl AdsClient {
    pub fn new(creds: Credentials, settings: AdsSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .user_agent("keyword-opportunity-scorer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            creds,
            settings,
            token: Mutex::new(None),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut guard = self.token.lock().await;
        if let Some(tok) = guard.as_ref().filter(|t| t.is_fresh()) {
            return Ok(tok.value.clone());
        }

        #[derive(Deserialize)]
        struct TokenResp {
            access_token: String,
            #[serde(default = "default_expires_in")]
            expires_in: u64,
        }
        fn default_expires_in() -> u64 {
            3600
        }

        let resp = self
            .http
            .post(&self.settings.token_url)
            .form(&[
                ("client_id", self.creds.client_id.as_str()),
                ("client_secret", self.creds.client_secret.as_str()),
                ("refresh_token", self.creds.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            let err = ProviderError::from_response(resp).await;
            return Err(ProviderError::Auth(err.to_string()));
        }
        let body: TokenResp = resp.json().await?;
        let tok = AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        };
        let value = tok.value.clone();
        *guard = Some(tok);
        tracing::debug!(expires_in = body.expires_in, "ads access token refreshed");
        Ok(value)
    }

    pub(crate) fn ideas_request<'a>(&self, keyword: &'a str) -> IdeasRequest<'a> {
        IdeasRequest {
            language: format!("languageConstants/{}", self.settings.language_id),
            geo_target_constants: vec![format!(
                "geoTargetConstants/{}",
                self.settings.geo_target_id
            )],
            include_adult_keywords: false,
            keyword_plan_network: self.settings.network.as_str(),
            keyword_seed: KeywordSeed {
                keywords: vec![keyword],
            },
        }
    }

    /// One ideas query seeded with a single keyword.
    pub async fn generate_keyword_ideas(
        &self,
        keyword: &str,
    ) -> Result<Vec<KeywordIdea>, ProviderError> {
        let account = self
            .creds
            .target_account()
            .map_err(ProviderError::MissingAccount)?;
        let token = self.access_token().await?;

        let url = format!(
            "{}/{}/customers/{}:generateKeywordIdeas",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.api_version,
            account
        );
        let mut req = self
            .http
            .post(url)
            .bearer_auth(token)
            .header("developer-token", &self.creds.developer_token)
            .json(&self.ideas_request(keyword));
        if let Some(login) = &self.creds.login_customer_id {
            req = req.header("login-customer-id", login.as_str());
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ProviderError::from_response(resp).await);
        }
        let body = resp.text().await?;
        parse_ideas(&body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdeasRequest<'a> {
    language: String,
    geo_target_constants: Vec<String>,
    include_adult_keywords: bool,
    keyword_plan_network: &'static str,
    keyword_seed: KeywordSeed<'a>,
}

#[derive(Debug, Serialize)]
struct KeywordSeed<'a> {
    keywords: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct IdeasResponse {
    #[serde(default)]
    results: Vec<WireIdea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIdea {
    #[serde(default)]
    text: String,
    #[serde(default)]
    keyword_idea_metrics: Option<WireMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetrics {
    #[serde(default, deserialize_with = "lenient_i64")]
    avg_monthly_searches: Option<i64>,
    #[serde(default)]
    competition: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    high_top_of_page_bid_micros: Option<i64>,
}

/// int64 fields arrive as JSON strings; accept numbers too.
fn lenient_i64<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }
    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

pub(crate) fn parse_ideas(body: &str) -> Result<Vec<KeywordIdea>, ProviderError> {
    let resp: IdeasResponse = serde_json::from_str(body)?;
    Ok(resp
        .results
        .into_iter()
        .map(|w| KeywordIdea {
            text: w.text,
            metrics: w.keyword_idea_metrics.map(|m| IdeaMetrics {
                avg_monthly_searches: m.avg_monthly_searches,
                competition: m.competition,
                high_top_of_page_bid_micros: m.high_top_of_page_bid_micros,
            }),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::credentials::RawCredentials;
    use crate::config::KeywordPlanNetwork;

    fn client(customer: Option<&str>) -> AdsClient {
        let raw = RawCredentials {
            developer_token: Some("dev".into()),
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            refresh_token: Some("refresh".into()),
            customer_id: customer.map(String::from),
            login_customer_id: None,
        };
        let settings = AdsSettings {
            network: KeywordPlanNetwork::GoogleSearchAndPartners,
            ..AdsSettings::default()
        };
        AdsClient::new(raw.validate().unwrap(), settings).unwrap()
    }

    #[test]
    fn request_body_uses_fixed_targets() {
        let c = client(Some("1234567890"));
        let v = serde_json::to_value(c.ideas_request("ginger tea")).unwrap();
        assert_eq!(v["language"], "languageConstants/1000");
        assert_eq!(v["geoTargetConstants"][0], "geoTargetConstants/2804");
        assert_eq!(v["keywordPlanNetwork"], "GOOGLE_SEARCH_AND_PARTNERS");
        assert_eq!(v["includeAdultKeywords"], false);
        assert_eq!(v["keywordSeed"]["keywords"][0], "ginger tea");
    }

    #[test]
    fn ideas_parse_string_and_number_int64() {
        let body = r#"{"results":[
            {"text":"ginger tea","keywordIdeaMetrics":{"avgMonthlySearches":"6600","competition":"MEDIUM","highTopOfPageBidMicros":"270000"}},
            {"text":"ginger tea benefits","keywordIdeaMetrics":{"avgMonthlySearches":880}},
            {"text":"no metrics"}
        ]}"#;
        let ideas = parse_ideas(body).unwrap();
        assert_eq!(ideas.len(), 3);
        let m = ideas[0].metrics.as_ref().unwrap();
        assert_eq!(m.avg_monthly_searches, Some(6600));
        assert_eq!(m.competition.as_deref(), Some("MEDIUM"));
        assert_eq!(m.high_top_of_page_bid_micros, Some(270_000));
        assert_eq!(ideas[1].metrics.as_ref().unwrap().avg_monthly_searches, Some(880));
        assert!(ideas[2].metrics.is_none());

        assert!(parse_ideas("{}").unwrap().is_empty());
        assert!(parse_ideas("not json").is_err());
    }

    #[tokio::test]
    async fn missing_account_fails_before_any_request() {
        let c = client(None);
        let err = c.generate_keyword_ideas("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingAccount(_)));
    }
}
