use std::sync::Arc;

use apollo_core::{Config, Provider};
use apollo_runner::Runner;
use apollo_scheduler::Scheduler;
use apollo_store::Store;
use axum::routing::{get, post};
use axum::Router;
use tracing::warn;

/// Central shared state — passed as `Arc<AppState>` to all handlers.
///
/// The scheduler and store exist only on the local provider with a
/// non-empty store configuration; on the cloud provider scheduling and
/// persistence live on the GCP side and both fields stay `None`, turning
/// the corresponding server paths into no-ops.
pub struct AppState {
    pub config: Config,
    pub runner: Arc<dyn Runner>,
    pub scheduler: Option<Scheduler>,
    pub store: Option<Store>,
}

impl AppState {
    /// Build state for the configured provider.
    ///
    /// A store that fails to open is degraded, not fatal: the server still
    /// serves RPCs, ListSchedules returns empty, and repeatable jobs run
    /// without persistence.
    pub async fn new(config: Config, runner: Arc<dyn Runner>) -> Self {
        let wants_store = config.provider == Provider::Local
            && !config.store.driver.is_empty()
            && !config.store.path.is_empty();

        let (scheduler, store) = if wants_store {
            let store = match Store::open(&config.store.driver, &config.store.path).await {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("store open failed, persistence disabled: {e}");
                    None
                }
            };
            (Some(Scheduler::new()), store)
        } else {
            (None, None)
        };

        Self {
            config,
            runner,
            scheduler,
            store,
        }
    }
}

/// Assemble the full axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/v1/jobs/run", post(crate::http::jobs::run_job))
        .route("/v1/jobs/delete", post(crate::http::jobs::delete_job))
        .route("/v1/jobs/schedule", post(crate::http::jobs::update_schedule))
        .route("/v1/jobs/list", post(crate::http::jobs::list_schedules))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
