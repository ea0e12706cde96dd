//! `apollo-server` — the orchestration façade.
//!
//! Exposes the four RPC methods over axum, owns the process-global
//! scheduler and store singletons, writes the execution audit trail, and
//! rehydrates the schedule table on boot.

pub mod app;
pub mod error;
pub mod http;
pub mod reload;

pub use app::{build_router, AppState};
pub use error::ApiError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
