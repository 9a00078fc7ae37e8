mod error;
mod fs_image_repository;

pub use error::StorageError;
pub use fs_image_repository::FsImageRepository;

use std::sync::Arc;

use crate::{application::repositories::ImageRepository, domain::config::ServerConfig};

pub fn create_image_repository(config: &ServerConfig) -> Arc<dyn ImageRepository> {
    Arc::new(FsImageRepository::new(config.uploads_dir.clone()))
}
