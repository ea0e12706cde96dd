use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider credentials missing: {0}")]
    Credentials(String),
}

pub type Result<T> = std::result::Result<T, SecretsError>;
