use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::{info, warn};

use crate::{
    adapters::dto::image_dto::UploadResponse,
    application::{
        error::ApplicationError,
        services::{ListingService, UploadService},
    },
    domain::models::file::UploadPayload,
};

/// Multipart field carrying the uploaded file.
pub const IMAGE_FIELD: &str = "image";

pub struct ImageController;

impl ImageController {
    /// GET /api/images
    pub async fn list_images(
        State(listing_service): State<Arc<ListingService>>,
    ) -> Result<Json<Vec<String>>, ApplicationError> {
        let images = listing_service.list().await?;
        Ok(Json(images))
    }

    /// POST /api/upload
    /// Body: multipart form with a single `image` file field
    pub async fn upload_image(
        State(upload_service): State<Arc<UploadService>>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Json<UploadResponse>, ApplicationError> {
        upload_service.prepare_storage().await?;

        let mut multipart = multipart.map_err(|e| {
            warn!("Invalid multipart request: {}", e);
            ApplicationError::ValidationFailure(format!("File upload failed: {}", e.body_text()))
        })?;

        let payload = read_image_field(&mut multipart).await?;
        info!(
            "Received upload '{}' ({} bytes)",
            payload.filename,
            payload.size()
        );

        let stored = upload_service.upload(payload).await?;
        Ok(Json(UploadResponse::stored(stored.filename)))
    }

    pub async fn listing_method_not_allowed() -> ApplicationError {
        ApplicationError::MethodNotAllowed("GET")
    }

    pub async fn upload_method_not_allowed() -> ApplicationError {
        ApplicationError::MethodNotAllowed("POST")
    }
}

async fn read_image_field(multipart: &mut Multipart) -> Result<UploadPayload, ApplicationError> {
    let mut payload: Option<UploadPayload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Invalid multipart data: {}", e);
        ApplicationError::ValidationFailure(format!("File upload failed: {}", e.body_text()))
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        if payload.is_some() {
            return Err(ApplicationError::ValidationFailure(
                "Only one file per upload is allowed".to_string(),
            ));
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ApplicationError::ValidationFailure(
                    "File upload failed: no file".to_string(),
                ))
            }
        };
        let declared_type = field.content_type().map(str::to_string);

        let content = field.bytes().await.map_err(|e| {
            warn!("Cannot read file bytes: {}", e);
            ApplicationError::ValidationFailure(format!("File upload failed: {}", e.body_text()))
        })?;

        payload = Some(UploadPayload::new(content.to_vec(), filename, declared_type));
    }

    payload.ok_or_else(|| {
        warn!("Missing required '{}' field in upload", IMAGE_FIELD);
        ApplicationError::ValidationFailure("File upload failed: no file".to_string())
    })
}
