use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying sqlx error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Delete targeted a name with no row.
    #[error("Job not found: {name}")]
    NotFound { name: String },

    /// `STORE_DRIVER` names a backend this build does not speak.
    #[error("Unsupported store driver: {0}")]
    UnsupportedDriver(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
