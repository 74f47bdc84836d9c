//! Configuration types
//!
//! - [`ClientConfig`]: where the provider API lives
//! - [`SolverConfig`]: the per-issuer config blob carried by a challenge request

use serde::{Deserialize, Serialize};

use crate::credentials::SecretKeySelector;

/// Production endpoint of the provider API
pub const DEFAULT_API_URL: &str = "https://api.beget.com";

/// API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the provider API, without the `/api/dns/...` path
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl ClientConfig {
    /// Create a configuration pointing at `api_url`
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_url.is_empty() {
            return Err(crate::Error::config("API URL cannot be empty"));
        }
        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(default_api_url())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Solver configuration decoded from a challenge request
///
/// ```json
/// {
///   "apiLoginSecretRef":  { "name": "beget-credentials", "key": "login" },
///   "apiPasswdSecretRef": { "name": "beget-credentials", "key": "passwd" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    /// Where the API login is stored
    #[serde(default)]
    pub api_login_secret_ref: SecretKeySelector,

    /// Where the API password is stored
    #[serde(default)]
    pub api_passwd_secret_ref: SecretKeySelector,
}

impl SolverConfig {
    /// Decode the config blob of a challenge request
    ///
    /// A missing blob yields the default configuration.
    pub fn from_json(blob: Option<&serde_json::Value>) -> Result<Self, crate::Error> {
        let Some(blob) = blob else {
            tracing::warn!("Challenge request carries no solver config, using defaults");
            return Ok(Self::default());
        };

        serde_json::from_value(blob.clone())
            .map_err(|e| crate::Error::config(format!("error decoding solver config: {}", e)))
    }
}
