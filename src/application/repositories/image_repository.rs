use async_trait::async_trait;

use crate::{application::error::ApplicationError, domain::models::image::StoredImage};

#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Creates the storage directory if it does not exist yet.
    async fn prepare(&self) -> Result<(), ApplicationError>;
    async fn ensure_writable(&self) -> Result<(), ApplicationError>;
    /// Writes `content` under `filename`; the file only becomes visible once
    /// complete. Returns `false`, leaving the existing file untouched, when the
    /// name is already taken.
    async fn store(&self, filename: &str, content: &[u8]) -> Result<bool, ApplicationError>;
    /// Regular files in the directory, unfiltered and unordered.
    async fn entries(&self) -> Result<Vec<StoredImage>, ApplicationError>;
}
