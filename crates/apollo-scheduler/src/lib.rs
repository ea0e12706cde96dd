//! `apollo-scheduler` — in-process cron scheduler.
//!
//! # Overview
//!
//! A [`Scheduler`] maps job names to live triggers. Each trigger is a Tokio
//! task that sleeps until the next cron occurrence and spawns the job
//! callback as a detached task, so a slow execution never delays — or is
//! delayed by — the next tick. Installing a schedule under an existing name
//! atomically replaces the prior trigger: there is at most one live trigger
//! per name at every observable instant.
//!
//! # Cron dialect
//!
//! Six fields with a leading seconds column. Five-field specs are accepted
//! by prepending `0`, giving them second `:00` semantics. [`cron::to_five_field`]
//! performs the reverse normalization for backends that only speak the
//! classic five-field form.

pub mod cron;
pub mod error;
pub mod scheduler;

pub use error::{Result, SchedulerError};
pub use scheduler::{JobFn, Scheduler};
