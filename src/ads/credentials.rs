// src/ads/credentials.rs
use std::fmt;

use crate::error::ConfigError;

pub const ENV_DEVELOPER_TOKEN: &str = "GOOGLE_ADS_DEVELOPER_TOKEN";
pub const ENV_CLIENT_ID: &str = "GOOGLE_ADS_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_ADS_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "GOOGLE_ADS_REFRESH_TOKEN";
pub const ENV_CUSTOMER_ID: &str = "GOOGLE_ADS_CUSTOMER_ID";
pub const ENV_LOGIN_CUSTOMER_ID: &str = "GOOGLE_ADS_LOGIN_CUSTOMER_ID";

/// Credentials as read, before validation. Blank values count as absent.
#[derive(Clone, Default)]
pub struct RawCredentials {
    pub developer_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub customer_id: Option<String>,
    pub login_customer_id: Option<String>,
}

impl RawCredentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup (env, file, test map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            developer_token: get(ENV_DEVELOPER_TOKEN),
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            refresh_token: get(ENV_REFRESH_TOKEN),
            customer_id: get(ENV_CUSTOMER_ID),
            login_customer_id: get(ENV_LOGIN_CUSTOMER_ID),
        }
    }

    /// Fails on missing or malformed developer token / OAuth values.
    /// The target account id is checked per call, not here.
    pub fn validate(self) -> Result<Credentials, ConfigError> {
        let developer_token = required(self.developer_token, ENV_DEVELOPER_TOKEN)?;
        let client_id = required(self.client_id, ENV_CLIENT_ID)?;
        let client_secret = required(self.client_secret, ENV_CLIENT_SECRET)?;
        let refresh_token = required(self.refresh_token, ENV_REFRESH_TOKEN)?;
        let login_customer_id = self
            .login_customer_id
            .map(|v| {
                CustomerId::parse(&v).map_err(|reason| ConfigError::Malformed {
                    name: ENV_LOGIN_CUSTOMER_ID,
                    reason,
                })
            })
            .transpose()?;
        Ok(Credentials {
            developer_token,
            client_id,
            client_secret,
            refresh_token,
            customer_id: self.customer_id,
            login_customer_id,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    let v = value.ok_or(ConfigError::Missing(name))?;
    if v.chars().any(char::is_whitespace) {
        return Err(ConfigError::Malformed {
            name,
            reason: "contains whitespace".to_string(),
        });
    }
    Ok(v)
}

/// Validated credentials. `Debug` never prints secrets.
#[derive(Clone)]
pub struct Credentials {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Raw target account id; parsed by `target_account`.
    pub customer_id: Option<String>,
    pub login_customer_id: Option<CustomerId>,
}

impl Credentials {
    /// The account ideas are requested for.
    pub fn target_account(&self) -> Result<CustomerId, String> {
        match &self.customer_id {
            Some(raw) => CustomerId::parse(raw),
            None => Err(format!("{ENV_CUSTOMER_ID} is not set")),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("developer_token", &redact(&self.developer_token))
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("customer_id", &self.customer_id)
            .field("login_customer_id", &self.login_customer_id)
            .finish()
    }
}

/// Safe diagnostics: only length and last 4 chars.
pub fn redact(secret: &str) -> String {
    let n = secret.chars().count();
    if n <= 8 {
        return format!("len={n}");
    }
    let suffix: String = secret.chars().skip(n - 4).collect();
    format!("len={n},…{suffix}")
}

/// Ten-digit account id; dashes are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let digits: String = raw.trim().chars().filter(|c| *c != '-').collect();
        if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(digits))
        } else {
            Err(format!("expected 10 digits, got {:?}", raw.trim()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_DEVELOPER_TOKEN, "devtoken-abcdefgh"),
            (ENV_CLIENT_ID, "1234.apps.googleusercontent.com"),
            (ENV_CLIENT_SECRET, "shhh-secret-value"),
            (ENV_REFRESH_TOKEN, "1//refresh-token-xyz"),
            (ENV_CUSTOMER_ID, "123-456-7890"),
        ])
    }

    fn raw(map: &HashMap<&'static str, &'static str>) -> RawCredentials {
        RawCredentials::from_lookup(|k| map.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn complete_set_validates() {
        let creds = raw(&full()).validate().unwrap();
        assert_eq!(creds.target_account().unwrap().as_str(), "1234567890");
        assert!(creds.login_customer_id.is_none());
    }

    #[test]
    fn each_required_credential_is_enforced() {
        for name in [
            ENV_DEVELOPER_TOKEN,
            ENV_CLIENT_ID,
            ENV_CLIENT_SECRET,
            ENV_REFRESH_TOKEN,
        ] {
            let mut m = full();
            m.insert(name, "   ");
            match raw(&m).validate() {
                Err(ConfigError::Missing(n)) => assert_eq!(n, name),
                other => panic!("expected Missing({name}), got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut m = full();
        m.insert(ENV_DEVELOPER_TOKEN, "dev token");
        assert!(matches!(
            raw(&m).validate(),
            Err(ConfigError::Malformed { name: ENV_DEVELOPER_TOKEN, .. })
        ));

        let mut m = full();
        m.insert(ENV_LOGIN_CUSTOMER_ID, "12-34");
        assert!(matches!(
            raw(&m).validate(),
            Err(ConfigError::Malformed { name: ENV_LOGIN_CUSTOMER_ID, .. })
        ));
    }

    #[test]
    fn missing_account_id_is_not_a_config_error() {
        let mut m = full();
        m.remove(ENV_CUSTOMER_ID);
        let creds = raw(&m).validate().unwrap();
        assert!(creds.target_account().is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = raw(&full()).validate().unwrap();
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("shhh-secret-value"));
        assert!(!dbg.contains("devtoken-abcdefgh"));
        assert!(dbg.contains("…efgh"));
        assert_eq!(redact("short"), "len=5");
    }
}
