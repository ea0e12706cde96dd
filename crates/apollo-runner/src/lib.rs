//! `apollo-runner` — pluggable execution backends.
//!
//! The [`Runner`] trait is the seam between the orchestration server and
//! whatever actually runs a workload. Two implementations:
//!
//! - [`local::LocalRunner`] spawns `docker run --rm …` on the host and
//!   waits for it, returning the container's combined output.
//! - [`batch::CloudBatchRunner`] creates a GCP Cloud Batch job per
//!   invocation over REST and returns the created resource name without
//!   waiting for task completion; recurring schedules are materialized as
//!   Cloud Scheduler entries that POST back into the Batch API.
//!
//! Cancellation follows future semantics: dropping an in-flight `run_job`
//! future (a disconnected RPC caller) abandons the spawn or API call.
//! Scheduler-fired executions run on detached tasks and are unaffected.

pub mod batch;
pub mod error;
pub mod local;
pub mod resources;
pub mod types;

mod gcp;

use async_trait::async_trait;

pub use batch::CloudBatchRunner;
pub use error::{Result, RunnerError};
pub use local::LocalRunner;
pub use types::{EnvPair, JobOverrides, JobRequest, JobType, Resources};

/// Common contract for execution backends.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Execute `req` and block until a terminal result exists: the combined
    /// container output for the local backend, the created execution's
    /// resource name for the cloud backend.
    async fn run_job(&self, entrypoint: &str, req: &JobRequest) -> Result<String>;

    /// Tear down any backend-side persistent artifact for `name`.
    /// Idempotent: absence is success.
    async fn delete_job(&self, name: &str) -> Result<()>;

    /// Create or update a backend-side recurring schedule. A no-op on the
    /// local backend, where scheduling lives in the in-process scheduler.
    async fn update_schedule(&self, name: &str, spec: &str) -> Result<()>;
}
