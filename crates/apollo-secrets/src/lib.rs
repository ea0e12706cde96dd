//! `apollo-secrets` — the secret set injected into every job container.
//!
//! Two halves:
//!
//! - [`infisical`]: a thin client for the Infisical secret provider. It is
//!   deliberately opaque — log in, list the project's secrets, return
//!   `{key, value}` pairs. Boot treats a provider failure as fatal only
//!   when `USE_INFISICAL=true`.
//! - [`merge`]: combines the provider's view with the operator-declared
//!   secrets from `jobs.yml` into the deduplicated set the runner layer
//!   injects into containers.

pub mod error;
pub mod infisical;
pub mod merge;

pub use error::{Result, SecretsError};
pub use infisical::InfisicalClient;
pub use merge::merge_secrets;
