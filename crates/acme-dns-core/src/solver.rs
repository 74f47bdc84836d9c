//! Challenge solver
//!
//! Implements the two-phase dns-01 contract:
//!
//! 1. **Present**: publish the challenge key as a TXT record
//! 2. **Clean up**: retract it
//!
//! ## Blind overwrite
//!
//! Neither phase reads the provider's current records. Present replaces the
//! domain's records with a set holding only the challenge TXT entry; clean up
//! replaces them with an empty set. Any other records on the challenge name
//! are clobbered. The provider API does not support keeping records across a
//! replace, and challenge names (`_acme-challenge.*`) normally hold nothing
//! else.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::SolverConfig;
use crate::credentials::{Credentials, resolve_credentials};
use crate::error::Result;
use crate::records::Records;
use crate::traits::{RecordsApi, SecretSource};

/// Name the solver registers under
pub const SOLVER_NAME: &str = "beget";

/// A dns-01 challenge as handed over by the calling framework
#[derive(Debug, Clone, Default)]
pub struct ChallengeRequest {
    /// Fully-qualified record name, usually with a trailing dot
    pub resolved_fqdn: String,
    /// TXT value to publish
    pub key: String,
    /// Namespace the credential secrets live in
    pub resource_namespace: String,
    /// Raw solver configuration
    pub config: Option<serde_json::Value>,
}

/// Strip leading and trailing dots from a domain name
///
/// The calling framework hands out absolute names (`example.com.`) while the
/// provider API expects the bare form.
pub fn trim_fqdn(fqdn: &str) -> &str {
    fqdn.trim_matches('.')
}

/// dns-01 challenge solver backed by a provider API
#[derive(Clone)]
pub struct Solver {
    api: Arc<dyn RecordsApi>,
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("provider", &self.api.provider_name())
            .finish()
    }
}

impl Solver {
    /// Create a solver driving `api`
    pub fn new(api: Arc<dyn RecordsApi>) -> Self {
        Self { api }
    }

    /// Solver name
    pub fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    /// Publish `key` as the only TXT record of `fqdn`
    pub async fn present(&self, fqdn: &str, key: &str, credentials: &Credentials) -> Result<()> {
        let fqdn = trim_fqdn(fqdn);
        let records = Records::new().with_txt(key);

        info!(fqdn, provider = self.api.provider_name(), "Presenting challenge record");

        self.api
            .replace_records(fqdn, &records, credentials)
            .await
            .inspect_err(|e| error!(fqdn, "Failed to present challenge record: {}", e))?;

        debug!(fqdn, "Challenge record presented");
        Ok(())
    }

    /// Remove every record of `fqdn`
    pub async fn clean_up(&self, fqdn: &str, credentials: &Credentials) -> Result<()> {
        let fqdn = trim_fqdn(fqdn);

        info!(fqdn, provider = self.api.provider_name(), "Cleaning up challenge records");

        self.api
            .replace_records(fqdn, &Records::new(), credentials)
            .await
            .inspect_err(|e| error!(fqdn, "Failed to clean up challenge records: {}", e))?;

        debug!(fqdn, "Challenge records cleaned up");
        Ok(())
    }

    /// Decode the request's config, resolve credentials, then [`Solver::present`]
    pub async fn present_challenge(
        &self,
        challenge: &ChallengeRequest,
        secrets: &dyn SecretSource,
    ) -> Result<()> {
        let credentials = self.credentials_for(challenge, secrets).await?;
        self.present(&challenge.resolved_fqdn, &challenge.key, &credentials)
            .await
    }

    /// Decode the request's config, resolve credentials, then [`Solver::clean_up`]
    pub async fn clean_up_challenge(
        &self,
        challenge: &ChallengeRequest,
        secrets: &dyn SecretSource,
    ) -> Result<()> {
        let credentials = self.credentials_for(challenge, secrets).await?;
        self.clean_up(&challenge.resolved_fqdn, &credentials).await
    }

    async fn credentials_for(
        &self,
        challenge: &ChallengeRequest,
        secrets: &dyn SecretSource,
    ) -> Result<Credentials> {
        let config = SolverConfig::from_json(challenge.config.as_ref())?;

        resolve_credentials(
            secrets,
            &challenge.resource_namespace,
            &config.api_login_secret_ref,
            &config.api_passwd_secret_ref,
        )
        .await
        .inspect_err(|e| error!(namespace = %challenge.resource_namespace, "Failed to resolve credentials: {}", e))
    }
}
