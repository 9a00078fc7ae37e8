use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Only {0} requests are allowed")]
    MethodNotAllowed(&'static str),

    #[error("{0}")]
    DirectoryUnavailable(String),

    #[error("{0}")]
    ValidationFailure(String),

    #[error("{0}")]
    StorageFailure(String),
}
