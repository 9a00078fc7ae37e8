use std::sync::Arc;

use tracing::debug;

use crate::application::{error::ApplicationError, repositories::ImageRepository};

pub struct ListingService {
    repository: Arc<dyn ImageRepository>,
}

impl ListingService {
    pub fn new(repository: Arc<dyn ImageRepository>) -> Self {
        Self { repository }
    }

    /// Image filenames in the storage directory, newest first.
    ///
    /// Files sharing a modification time keep the order the directory
    /// returned them in, which is platform dependent.
    pub async fn list(&self) -> Result<Vec<String>, ApplicationError> {
        self.repository.prepare().await?;

        let mut images: Vec<_> = self
            .repository
            .entries()
            .await?
            .into_iter()
            .filter(|image| image.format().is_some())
            .collect();

        images.sort_by(|a, b| b.modified.cmp(&a.modified));

        debug!("Listing {} images", images.len());

        Ok(images.into_iter().map(|image| image.filename).collect())
    }
}
