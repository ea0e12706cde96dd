//! Boot-time schedule rehydration.

use std::sync::Arc;
use std::time::Duration;

use apollo_runner::{JobRequest, JobType, Resources};
use tracing::{info, warn};

use crate::app::AppState;
use crate::http::jobs::scheduled_job;

/// Re-register every persisted repeatable job with the in-process
/// scheduler. A 50 ms pause between registrations staggers the timer
/// tasks so a restart does not align every schedule on second `:00`.
///
/// Running this twice against the same store is idempotent: scheduling
/// under an existing name replaces the prior trigger.
pub async fn reload(state: &Arc<AppState>) {
    let (Some(scheduler), Some(store)) = (&state.scheduler, &state.store) else {
        return;
    };

    let records = match store.list().await {
        Ok(records) => records,
        Err(e) => {
            warn!("scheduler reload failed: {e}");
            return;
        }
    };

    let count = records.len();
    for record in records {
        let req = JobRequest {
            name: record.name.clone(),
            command: record.command,
            args_base64: record.args_base64,
            resources: Resources {
                cpu: record.cpu,
                memory: record.memory,
            },
            job_type: JobType::Repeatable,
            schedule_spec: record.cron_spec.clone(),
            ..Default::default()
        };

        let job = scheduled_job(
            Arc::clone(&state.runner),
            state.store.clone(),
            state.config.jobs.cmd.clone(),
            req,
        );

        if let Err(e) = scheduler.schedule(&record.name, &record.cron_spec, job) {
            warn!(job = %record.name, "failed to restore schedule: {e}");
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    info!(count, "schedules reloaded from store");
}
