//! The four job RPC handlers.

use std::sync::Arc;

use apollo_proto as proto;
use apollo_runner::{EnvPair, JobOverrides, JobRequest, JobType, Resources, Runner};
use apollo_scheduler::JobFn;
use apollo_store::{ExecutionRecord, ExecutionStatus, JobRecord, Store};
use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::error::ApiError;

/// POST /v1/jobs/run
///
/// Repeatable requests with a live scheduler register a trigger and
/// persist the definition; everything else executes synchronously and
/// responds with the runner's terminal result. In both paths the audit
/// row is written before the response (or the error) leaves the server.
pub async fn run_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<proto::RunJobRequest>,
) -> Result<Json<proto::RunJobResponse>, ApiError> {
    let mut r = to_runner_request(&req);

    // Config-level defaults apply only when the request carries neither
    // resource field.
    if r.resources.cpu.is_empty() && r.resources.memory.is_empty() {
        let defaults = state.config.resources_for(&r.command);
        r.resources.cpu = defaults.cpu;
        r.resources.memory = defaults.memory;
    }

    if r.job_type == JobType::Repeatable && !r.schedule_spec.is_empty() {
        if let Some(scheduler) = &state.scheduler {
            let name = r.name.clone();
            let job = scheduled_job(
                Arc::clone(&state.runner),
                state.store.clone(),
                state.config.jobs.cmd.clone(),
                r.clone(),
            );
            scheduler.schedule(&name, &r.schedule_spec, job)?;

            if let Some(store) = &state.store {
                let record = JobRecord {
                    name: r.name.clone(),
                    command: r.command.clone(),
                    args_base64: r.args_base64.clone(),
                    cron_spec: r.schedule_spec.clone(),
                    cpu: r.resources.cpu.clone(),
                    memory: r.resources.memory.clone(),
                };
                if let Err(e) = store.upsert(&record).await {
                    warn!(job = %r.name, "job upsert failed: {e}");
                }
            }

            return Ok(Json(proto::RunJobResponse {
                id: name,
                logs: "scheduled".to_string(),
            }));
        }
    }

    // Synchronous path: one-shot requests, and repeatable requests on a
    // provider without an in-process scheduler.
    let started_at = Utc::now().timestamp();
    if r.job_id.is_empty() {
        r.job_id = generate_job_id(&r.name);
    }

    info!(job = %r.job_id, cmd = %state.config.jobs.cmd, command = %r.command, "running job");

    let outcome = state.runner.run_job(&state.config.jobs.cmd, &r).await;
    let finished_at = Utc::now().timestamp();

    record_execution(
        state.store.as_ref(),
        &r,
        &r.job_id,
        &outcome,
        started_at,
        finished_at,
    )
    .await;

    let logs = outcome?;
    Ok(Json(proto::RunJobResponse { id: r.job_id, logs }))
}

/// POST /v1/jobs/delete
///
/// Scheduler and store removals are best-effort; only a runner failure
/// reaches the caller.
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<proto::DeleteJobRequest>,
) -> Result<Json<proto::DeleteJobResponse>, ApiError> {
    if let Some(scheduler) = &state.scheduler {
        scheduler.delete(&req.name);
    }
    if let Some(store) = &state.store {
        if let Err(e) = store.delete(&req.name).await {
            warn!(job = %req.name, "store delete skipped: {e}");
        }
    }
    state.runner.delete_job(&req.name).await?;
    Ok(Json(proto::DeleteJobResponse::default()))
}

/// POST /v1/jobs/schedule
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Json(req): Json<proto::UpdateScheduleRequest>,
) -> Result<Json<proto::UpdateScheduleResponse>, ApiError> {
    if let Some(scheduler) = &state.scheduler {
        if req.schedule.is_empty() {
            scheduler.delete(&req.name);
            return Ok(Json(proto::UpdateScheduleResponse::default()));
        }
        // A server-managed reschedule would need the original command and
        // args, which this RPC does not carry.
        return Err(ApiError::InvalidArgument(
            "reschedule requires rerun with RunJob on the local provider".to_string(),
        ));
    }

    state.runner.update_schedule(&req.name, &req.schedule).await?;
    Ok(Json(proto::UpdateScheduleResponse::default()))
}

/// POST /v1/jobs/list
pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
    Json(_req): Json<proto::ListSchedulesRequest>,
) -> Result<Json<proto::ListSchedulesResponse>, ApiError> {
    let Some(store) = &state.store else {
        return Ok(Json(proto::ListSchedulesResponse::default()));
    };

    let records = store.list().await?;
    let items = records
        .into_iter()
        .map(|r| proto::ScheduleItem {
            name: r.name,
            command: r.command,
            args_base64: r.args_base64,
            cron: r.cron_spec,
            resources: proto::Resources {
                cpu: r.cpu,
                memory: r.memory,
            },
        })
        .collect();

    Ok(Json(proto::ListSchedulesResponse { items }))
}

/// Build the callback fired on every scheduler tick for `base`.
///
/// Each firing clones the request, stamps a fresh job id, runs the job on
/// its own detached task, and appends an audit row. Only the handles the
/// callback needs are captured — never the whole `AppState`.
pub(crate) fn scheduled_job(
    runner: Arc<dyn Runner>,
    store: Option<Store>,
    entrypoint: String,
    base: JobRequest,
) -> JobFn {
    Arc::new(move || {
        let runner = Arc::clone(&runner);
        let store = store.clone();
        let entrypoint = entrypoint.clone();
        let mut req = base.clone();

        Box::pin(async move {
            let started_at = Utc::now().timestamp();
            if req.job_id.is_empty() {
                req.job_id = generate_job_id(&req.name);
            }

            info!(job = %req.job_id, cmd = %entrypoint, command = %req.command, "running scheduled job");

            let outcome = runner.run_job(&entrypoint, &req).await;
            let finished_at = Utc::now().timestamp();

            if let Err(e) = &outcome {
                error!(job = %req.job_id, "scheduled run failed: {e}");
            }

            let id = req.job_id.clone();
            record_execution(store.as_ref(), &req, &id, &outcome, started_at, finished_at).await;
        })
    })
}

/// Append the audit row for one execution attempt.
///
/// Store failures are logged and swallowed — they must never mask the
/// execution result the caller is waiting on.
pub(crate) async fn record_execution(
    store: Option<&Store>,
    req: &JobRequest,
    id: &str,
    outcome: &apollo_runner::Result<String>,
    started_at: i64,
    finished_at: i64,
) {
    let Some(store) = store else {
        warn!(job = %id, "no store configured; execution not recorded");
        return;
    };

    let record = ExecutionRecord {
        id: id.to_string(),
        name: req.name.clone(),
        command: req.command.clone(),
        args_base64: req.args_base64.clone(),
        cpu: req.resources.cpu.clone(),
        memory: req.resources.memory.clone(),
        status: match outcome {
            Ok(_) => ExecutionStatus::Success,
            Err(_) => ExecutionStatus::Error,
        },
        error: outcome.as_ref().err().map(|e| e.to_string()).unwrap_or_default(),
        result: outcome.as_ref().ok().cloned().unwrap_or_default(),
        started_at,
        finished_at,
    };

    if let Err(e) = store.add_execution(&record).await {
        error!(job = %id, "failed to record execution: {e}");
    }
}

pub(crate) fn generate_job_id(name: &str) -> String {
    format!("job-{}-{}", name, Utc::now().timestamp())
}

fn to_runner_request(req: &proto::RunJobRequest) -> JobRequest {
    JobRequest {
        name: req.name.clone(),
        job_id: req.job_id.clone(),
        command: req.command.clone(),
        args_base64: req.args_base64.clone(),
        resources: Resources {
            cpu: req.resources.cpu.clone(),
            memory: req.resources.memory.clone(),
        },
        job_type: match req.job_type {
            proto::JobType::OneTime => JobType::OneTime,
            proto::JobType::Repeatable => JobType::Repeatable,
        },
        schedule_spec: req.schedule.clone(),
        overrides: req.overrides.as_ref().map(|o| JobOverrides {
            args: o.args.clone(),
            env: o
                .env
                .iter()
                .map(|e| EnvPair {
                    name: e.name.clone(),
                    value: e.value.clone(),
                })
                .collect(),
            resources: o.resources.as_ref().map(|r| Resources {
                cpu: r.cpu.clone(),
                memory: r.memory.clone(),
            }),
            task_count: o.task_count,
        }),
    }
}
