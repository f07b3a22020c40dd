use pricebook_core::db::DbError;
use pricebook_core::{RequestError, ServiceError, StoreError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Request(_) | Self::Service(ServiceError::Validation(_)) => 2,
            Self::Service(ServiceError::NotFound(_)) | Self::Store(StoreError::NotFound(_)) => 4,
            Self::Logging(_) => 5,
            Self::Service(_)
            | Self::Store(_)
            | Self::Db(_)
            | Self::Serialization(_)
            | Self::Io(_) => 10,
        }
    }
}
