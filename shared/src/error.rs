use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::AlreadyExists(_) => 409,
            Error::Validation(_) | Error::InvalidInput(_) | Error::InvalidConfiguration(_) => 400,
            _ => 500,
        }
    }
}

/// JSON body shape returned alongside `status_code()` by HTTP handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        let kind = match err {
            Error::Database(_) => "database_error",
            Error::Redis(_) => "redis_error",
            Error::Serialization(_) => "serialization_error",
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::Internal(_) => "internal_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidConfiguration(_) => "invalid_configuration",
        };
        Self {
            error: kind.to_string(),
            message: err.to_string(),
        }
    }
}

/// Adds ad-hoc context to a `Result` without losing the original error's variant-derived
/// status code.
pub trait ErrorExt<T> {
    fn context_msg(self, msg: impl Into<String>) -> Result<T>;
}

impl<T> ErrorExt<T> for Result<T> {
    fn context_msg(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Internal(format!("{}: {}", msg.into(), e)))
    }
}
