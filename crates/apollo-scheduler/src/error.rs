use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron spec could not be parsed; the scheduler state is unchanged.
    #[error("Invalid cron spec {spec:?}: {reason}")]
    InvalidSpec { spec: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
