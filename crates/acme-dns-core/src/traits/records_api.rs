// # Records API Trait
//
// Defines the interface for reading and replacing a domain's records through
// a DNS provider's management API.
//
// ## Implementations
//
// - Beget: `acme-dns-beget` crate
//
// ## Usage
//
// ```rust,ignore
// use acme_dns_core::{Credentials, Records, RecordsApi};
//
// async fn publish(api: &dyn RecordsApi, creds: &Credentials) -> acme_dns_core::Result<()> {
//     let records = Records::new().with_txt("token123");
//     api.replace_records("_acme-challenge.example.com", &records, creds).await
// }
// ```

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::records::Records;

/// Trait for provider API clients
///
/// # Contract
///
/// - One request per call. No retries, no backoff: callers (ultimately the
///   ACME validator) retry whole operations.
/// - No state beyond a single call. Records are never cached; every fetch
///   returns a fresh copy.
/// - `fqdn` is sent as given. Trailing-dot handling belongs to the caller.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// Fetch every record the provider holds for `fqdn`
    ///
    /// An unknown domain is not an error for providers that answer it with
    /// an empty set.
    async fn fetch_records(
        &self,
        fqdn: &str,
        credentials: &Credentials,
    ) -> Result<Records, crate::Error>;

    /// Replace every record the provider holds for `fqdn` with `records`
    ///
    /// An empty `records` clears the domain.
    async fn replace_records(
        &self,
        fqdn: &str,
        records: &Records,
        credentials: &Credentials,
    ) -> Result<(), crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
