//! `apollo-store` — durable job definitions and execution audit rows.
//!
//! Two tables:
//!
//! - `apollo_jobs`: one row per repeatable job, keyed by name. Upserted on
//!   every repeatable RunJob, removed by DeleteJob. While the server is up,
//!   every row corresponds to exactly one live scheduler trigger.
//! - `apollo_executions`: append-only audit log, one row per execution
//!   attempt (synchronous or scheduler-fired). Never mutated after insert.
//!
//! The same implementation speaks both backends through sqlx's Any driver:
//! SQL is written once with `?` placeholders and rewritten to `$1..$N` for
//! Postgres, and the upsert statement switches between `INSERT OR REPLACE`
//! (sqlite) and `ON CONFLICT(name) DO UPDATE` (postgres). Migrations are
//! idempotent `CREATE ... IF NOT EXISTS` statements run at open.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{Dialect, ExecutionRecord, ExecutionStatus, JobRecord, Store};
