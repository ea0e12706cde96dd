//! Runner-level request types. The server copies the wire request into
//! these before handing it to a backend, so the runner layer never sees
//! transport details.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobType {
    #[default]
    OneTime,
    Repeatable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    pub cpu: String,
    pub memory: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    /// Extra argv entries, appended after everything else.
    pub args: Vec<String>,
    /// Env entries injected after the merged secret set so same-key
    /// overrides win by last-write-wins.
    pub env: Vec<EnvPair>,
    /// Wholly replaces the request resources when present.
    pub resources: Option<Resources>,
    /// Batch-backend task multiplier; values ≤ 0 mean 1.
    pub task_count: i32,
}

#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub name: String,
    pub job_id: String,
    pub command: String,
    pub args_base64: String,
    pub resources: Resources,
    pub job_type: JobType,
    pub schedule_spec: String,
    pub overrides: Option<JobOverrides>,
}

impl JobRequest {
    /// Resources in effect for this request: the override set when present,
    /// else the request baseline.
    pub fn effective_resources(&self) -> &Resources {
        match self.overrides.as_ref().and_then(|o| o.resources.as_ref()) {
            Some(r) => r,
            None => &self.resources,
        }
    }

    /// Batch task count: `overrides.task_count` when ≥ 1, else 1.
    pub fn effective_task_count(&self) -> i64 {
        match &self.overrides {
            Some(o) if o.task_count >= 1 => i64::from(o.task_count),
            _ => 1,
        }
    }
}
