use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// The container process could not be spawned, or exited non-zero.
    /// The message carries the captured output.
    #[error("local run failed: {0}")]
    Spawn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloud API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials are missing or the token exchange failed.
    #[error("GCP auth error: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
