//! Core traits
//!
//! The seams between the challenge solver, the provider API and the state
//! behind a simulated provider.
//!
//! - [`RecordsApi`]: Fetch and replace a domain's records at a provider
//! - [`RecordStore`]: Authoritative per-domain record state
//! - [`SecretSource`]: Where credential secrets are read from

pub mod record_store;
pub mod records_api;
pub mod secret_source;

pub use record_store::RecordStore;
pub use records_api::RecordsApi;
pub use secret_source::{SecretData, SecretSource};
