//! `apollo-core` — configuration and shared types for the Apollo job
//! orchestrator.
//!
//! Configuration comes from two places, merged at load time:
//!
//! 1. Flat environment variables (`PORT`, `STORE_DRIVER`, `JOBS_PROVIDER`, …)
//! 2. A `jobs.yml` file describing the workload image, its entrypoint, the
//!    secrets to expose to every container, and per-job resource defaults.

pub mod config;
pub mod types;

pub use config::{Config, JobConfig, JobsConfig, Provider, ResourceConfig, SecretConfig, StoreConfig};
pub use types::Secret;
