use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    application::{
        repositories::ImageRepository,
        services::{ListingService, UploadService},
    },
    domain::config::ServerConfig,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub upload_service: Arc<UploadService>,
    pub listing_service: Arc<ListingService>,
}

impl AppState {
    pub fn new(config: ServerConfig, image_repository: Arc<dyn ImageRepository>) -> Self {
        Self {
            config: Arc::new(config),
            upload_service: Arc::new(UploadService::new(image_repository.clone())),
            listing_service: Arc::new(ListingService::new(image_repository)),
        }
    }
}
