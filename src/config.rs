use std::env;
use std::time::Duration;

pub const DEFAULT_VOLC_API_URL: &str = "https://visual.volcengineapi.com";

/// Access key pair used to sign vendor requests. Never serialized back to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub volc_access_key: Option<String>,
    pub volc_secret_key: Option<String>,
    pub volc_api_url: String,
    pub volc_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source shaped like the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            volc_access_key: lookup("VOLC_ACCESS_KEY"),
            volc_secret_key: lookup("VOLC_SECRET_KEY"),
            volc_api_url: lookup("VOLC_API_URL")
                .unwrap_or_else(|| DEFAULT_VOLC_API_URL.to_string()),
            volc_timeout: lookup("VOLC_TIMEOUT_SECS").map(|secs| {
                Duration::from_secs(
                    secs.parse()
                        .expect("VOLC_TIMEOUT_SECS must be a whole number of seconds"),
                )
            }),
        }
    }

    /// Both keys must be present and non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        let access_key_id = self.volc_access_key.as_deref().filter(|k| !k.is_empty())?;
        let secret_key = self.volc_secret_key.as_deref().filter(|k| !k.is_empty())?;
        Some(Credentials {
            access_key_id: access_key_id.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    pub fn http_client(&self) -> reqwest::Client {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.volc_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().expect("Failed to build HTTP client")
    }
}
