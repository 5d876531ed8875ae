// src/ads/cache.rs
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

use crate::ads::client::AdsClient;
use crate::ads::credentials::{redact, RawCredentials};
use crate::config::AdsSettings;
use crate::error::ConfigError;

type CredentialLoader = dyn Fn() -> RawCredentials + Send + Sync;

/// Owner of the process-lifetime ads client.
///
/// The client is built on first `get()` (or an eager `get()` at startup),
/// at most once even when many tasks race on first use. A failed build
/// leaves the cache empty and returns the `ConfigError` to the caller.
pub struct ClientCache {
    settings: AdsSettings,
    loader: Box<CredentialLoader>,
    cell: OnceCell<Arc<AdsClient>>,
}

impl ClientCache {
    /// Credentials come from `GOOGLE_ADS_*` env vars.
    pub fn from_env(settings: AdsSettings) -> Self {
        Self::with_loader(settings, RawCredentials::from_env)
    }

    pub fn with_loader<F>(settings: AdsSettings, loader: F) -> Self
    where
        F: Fn() -> RawCredentials + Send + Sync + 'static,
    {
        Self {
            settings,
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Result<Arc<AdsClient>, ConfigError> {
        self.cell
            .get_or_try_init(|| self.build())
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    fn build(&self) -> Result<Arc<AdsClient>, ConfigError> {
        let creds = (self.loader)().validate()?;
        // Safe diagnostics: only lengths and short suffixes
        info!(
            developer_token = %redact(&creds.developer_token),
            client_id = %redact(&creds.client_id),
            refresh_token = %redact(&creds.refresh_token),
            has_customer_id = creds.customer_id.is_some(),
            has_login_customer_id = creds.login_customer_id.is_some(),
            "ads client constructed"
        );
        Ok(Arc::new(AdsClient::new(creds, self.settings.clone())?))
    }
}
