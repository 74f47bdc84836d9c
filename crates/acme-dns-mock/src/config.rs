//! Simulation server configuration

use acme_dns_core::{Credentials, Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default listen address of the HTTP management surface
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Default listen address of the DNS query surface
pub const DEFAULT_DNS_ADDR: &str = "127.0.0.1:59351";

/// Configuration of a [`crate::MockProvider`]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Login every API call must present
    pub login: String,

    /// Password every API call must present
    pub passwd: String,

    /// Where the HTTP management surface listens
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// Where the DNS query surface listens
    #[serde(default = "default_dns_addr")]
    pub dns_addr: SocketAddr,
}

impl MockConfig {
    /// Create a configuration with the default listen addresses
    pub fn new(login: impl Into<String>, passwd: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            passwd: passwd.into(),
            http_addr: default_http_addr(),
            dns_addr: default_dns_addr(),
        }
    }

    /// Validate the configuration
    ///
    /// Both listeners on one port is fine (TCP vs UDP); empty credentials are not.
    pub fn validate(&self) -> Result<()> {
        if self.login.is_empty() {
            return Err(Error::config("login cannot be empty"));
        }
        if self.passwd.is_empty() {
            return Err(Error::config("passwd cannot be empty"));
        }
        Ok(())
    }

    /// The credential pair clients must present
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.passwd.clone())
    }
}

impl std::fmt::Debug for MockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConfig")
            .field("login", &self.login)
            .field("passwd", &"<REDACTED>")
            .field("http_addr", &self.http_addr)
            .field("dns_addr", &self.dns_addr)
            .finish()
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_dns_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 59351))
}
