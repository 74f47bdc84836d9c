//! Secret source trait
//!
//! Credentials are resolved from named secrets inside a namespace, each
//! holding a map of keys to raw bytes (the shape of a Kubernetes `Secret`).

use async_trait::async_trait;
use std::collections::HashMap;

/// The data of one secret
pub type SecretData = HashMap<String, Vec<u8>>;

/// Trait for reading secrets
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Read the secret `name` in `namespace`
    ///
    /// A missing secret is an error; a missing key is for the caller to report.
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, crate::Error>;
}
