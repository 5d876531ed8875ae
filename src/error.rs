//! Error classes of the scoring pipeline.
//!
//! `ConfigError` means the process cannot talk to a provider at all and is
//! always propagated to the caller. `ProviderError` is a per-call failure and
//! never leaves a provider: it is folded into that provider's fallback value.

/// Missing or malformed provider credentials.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required credential is absent or blank. Carries the env var name.
    #[error("missing required credential {0}")]
    Missing(&'static str),

    /// A credential is present but cannot be used as-is.
    #[error("malformed credential {name}: {reason}")]
    Malformed { name: &'static str, reason: String },

    /// The HTTP client backing the provider could not be built.
    #[error("provider http client: {0}")]
    HttpClient(String),
}

/// Per-call failure of a remote provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Surfaced from the client cache; never folded into a fallback.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No usable target account id is configured.
    #[error("target account id: {0}")]
    MissingAccount(String),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status. `body` is truncated.
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("decode: {0}")]
    Decode(String),

    /// OAuth token exchange failed.
    #[error("auth: {0}")]
    Auth(String),
}

impl ProviderError {
    /// Build a `Status` error from a failed response, keeping at most 300 chars of the body.
    pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body: String = body.chars().take(300).collect();
        ProviderError::Status { status, body }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Decode(e.to_string())
    }
}

/// Failure of a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A keyword worker task was cancelled before finishing.
    #[error("keyword worker aborted: {0}")]
    Worker(String),
}
