//! `apollo-proto` — wire types for the Apollo RPC surface.
//!
//! Four unary methods, all JSON-over-HTTP POST:
//!
//! | Route                   | Request                 | Response                 |
//! |-------------------------|-------------------------|--------------------------|
//! | `/v1/jobs/run`          | [`RunJobRequest`]       | [`RunJobResponse`]       |
//! | `/v1/jobs/delete`       | [`DeleteJobRequest`]    | [`DeleteJobResponse`]    |
//! | `/v1/jobs/schedule`     | [`UpdateScheduleRequest`] | [`UpdateScheduleResponse`] |
//! | `/v1/jobs/list`         | [`ListSchedulesRequest`] | [`ListSchedulesResponse`] |
//!
//! Enum values keep their protobuf-style names (`JOB_TYPE_ONE_TIME`) so
//! clients generated against the original schema keep working unchanged.

use serde::{Deserialize, Serialize};

/// One-shot vs cron-scheduled execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "JOB_TYPE_ONE_TIME")]
    OneTime,
    #[serde(rename = "JOB_TYPE_REPEATABLE")]
    Repeatable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

/// One `{name, value}` environment pair carried in overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Per-call modifications layered atop the request baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOverrides {
    /// Extra positional/flag arguments, appended after the base argv.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment entries injected after the merged secret set, so an
    /// override of the same key wins via last-write-wins.
    #[serde(default)]
    pub env: Vec<EnvVar>,
    /// When present, wholly replaces the request's resources.
    #[serde(default)]
    pub resources: Option<Resources>,
    /// Parallel task multiplier for the batch backend; values ≤ 0 mean 1.
    #[serde(default)]
    pub task_count: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunJobRequest {
    /// Stable identifier; unique per repeatable schedule.
    pub name: String,
    /// Per-execution identifier; generated as `job-<name>-<unix_seconds>`
    /// when empty.
    #[serde(default)]
    pub job_id: String,
    /// Workload sub-command the container entrypoint dispatches on.
    #[serde(default)]
    pub command: String,
    /// Opaque payload, passed verbatim as a positional argument.
    #[serde(default)]
    pub args_base64: String,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default, rename = "type")]
    pub job_type: JobType,
    /// Cron spec; required when `type` is repeatable.
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub overrides: Option<JobOverrides>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJobResponse {
    pub id: String,
    pub logs: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteJobRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteJobResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: String,
    /// New cron spec; empty clears the schedule on the local provider.
    #[serde(default)]
    pub schedule: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleResponse {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSchedulesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args_base64: String,
    pub cron: String,
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSchedulesResponse {
    #[serde(default)]
    pub items: Vec<ScheduleItem>,
}
