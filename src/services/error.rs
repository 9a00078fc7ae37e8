use std::io;

use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not create uploads directory: {0}")]
    CreateDirectory(#[source] io::Error),

    #[error("Could not access uploads directory: {0}")]
    Inspect(#[source] io::Error),

    #[error("No write permission for uploads directory")]
    NotWritable,

    #[error("Could not read uploads directory: {0}")]
    ReadDirectory(#[source] io::Error),

    #[error("Failed to save file: {0}")]
    Write(#[source] io::Error),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::CreateDirectory(_)
            | StorageError::Inspect(_)
            | StorageError::NotWritable => ApplicationError::DirectoryUnavailable(error.to_string()),
            StorageError::ReadDirectory(_) | StorageError::Write(_) => {
                ApplicationError::StorageFailure(error.to_string())
            }
        }
    }
}
