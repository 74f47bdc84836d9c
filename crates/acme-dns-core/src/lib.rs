// # acme-dns-core
//
// Core library for solving ACME dns-01 challenges through a DNS provider's
// record-management API.
//
// ## Architecture Overview
//
// - **Records**: Provider-defined per-domain record set, with idempotent TXT
//   upsert and delete-by-value
// - **RecordsApi**: Trait for fetching/replacing a domain's records at a provider
// - **RecordStore**: Trait for authoritative record state (used by the simulated provider)
// - **Solver**: Present/clean-up orchestration on top of a RecordsApi
// - **Credentials**: Login/password pair and its resolution from secrets
//
// ## Data Flow
//
// Solver → Records (desired set) → RecordsApi (serialize + POST) → provider
// → RecordStore → DNS / fetch reads

pub mod config;
pub mod credentials;
pub mod error;
pub mod records;
pub mod solver;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{ClientConfig, SolverConfig};
pub use credentials::{Credentials, InMemorySecretSource, SecretKeySelector, resolve_credentials};
pub use error::{ApiErrorDetail, Error, Result};
pub use records::{Entry, Records, TXT_DATA_KEY, TXT_KEY};
pub use solver::{ChallengeRequest, Solver, trim_fqdn};
pub use state::MemoryRecordStore;
pub use traits::{RecordStore, RecordsApi, SecretSource};
