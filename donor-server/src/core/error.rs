use thiserror::Error;

use crate::utils::AppError;

/// Errors that stop the server from starting or keep running
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database initialization failed: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        ServerError::Database(err.message)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
