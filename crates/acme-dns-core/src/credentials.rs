//! Provider credentials and their resolution from secrets
//!
//! The provider authenticates every call with a login/password pair. The
//! pair is read from one or two secrets named by [`SecretKeySelector`]s in the
//! challenge's solver configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::traits::{SecretData, SecretSource};

/// Login/password pair for the provider API
///
/// The Debug implementation intentionally does NOT expose the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API login
    pub login: String,
    /// API password
    /// ⚠️ NEVER log this value
    pub passwd: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(login: impl Into<String>, passwd: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            passwd: passwd.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("passwd", &"<REDACTED>")
            .finish()
    }
}

/// Reference to one key inside a named secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    /// Secret name
    #[serde(default)]
    pub name: String,
    /// Key inside the secret
    #[serde(default)]
    pub key: String,
}

impl SecretKeySelector {
    /// Create a selector
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

fn lookup_key(data: &SecretData, selector: &SecretKeySelector, namespace: &str) -> Result<String> {
    let bytes = data.get(&selector.key).ok_or_else(|| Error::KeyNotFound {
        key: selector.key.clone(),
        secret: selector.name.clone(),
        namespace: namespace.to_string(),
    })?;

    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Resolve the login/password pair for a challenge
///
/// The login secret is always read. When the password selector names the
/// same secret it is reused, otherwise the second secret is read as well.
pub async fn resolve_credentials(
    source: &dyn SecretSource,
    namespace: &str,
    login: &SecretKeySelector,
    passwd: &SecretKeySelector,
) -> Result<Credentials> {
    tracing::debug!(namespace, secret = %login.name, "Resolving provider credentials");

    let login_secret = source.get_secret(namespace, &login.name).await?;
    let login_value = lookup_key(&login_secret, login, namespace)?;

    let passwd_value = if login.name == passwd.name {
        lookup_key(&login_secret, passwd, namespace)?
    } else {
        let passwd_secret = source.get_secret(namespace, &passwd.name).await?;
        lookup_key(&passwd_secret, passwd, namespace)?
    };

    Ok(Credentials::new(login_value, passwd_value))
}

/// In-memory secret source
///
/// Secrets are keyed by `(namespace, name)`.
#[derive(Debug, Default)]
pub struct InMemorySecretSource {
    secrets: RwLock<HashMap<(String, String), SecretData>>,
}

impl InMemorySecretSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a secret
    pub fn insert<K, V>(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        data: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut secrets = self
            .secrets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        secrets.insert((namespace.into(), name.into()), data);
    }
}

#[async_trait]
impl SecretSource for InMemorySecretSource {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData> {
        let secrets = self
            .secrets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::credentials(format!("secret \"{namespace}/{name}\" not found")))
    }
}
