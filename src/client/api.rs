use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use tracing::debug;

use crate::{
    adapters::{
        controllers::image_controller::IMAGE_FIELD,
        dto::image_dto::{ErrorResponse, UploadResponse},
    },
    client::error::ClientError,
};

/// Anything that can produce the current image listing.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<Vec<String>, ClientError>;
}

/// HTTP client for the slideshow backend.
pub struct ImageApi {
    client: Client,
    base_url: String,
}

impl ImageApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where a stored image is served from.
    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/uploads/{}", self.base_url, filename)
    }

    pub async fn upload(
        &self,
        filename: &str,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<UploadResponse, ClientError> {
        let part = multipart::Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(mime_type)?;
        let form = multipart::Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ListingSource for ImageApi {
    async fn fetch_listing(&self) -> Result<Vec<String>, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/images", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let images: Vec<String> = response.json().await?;
        debug!("Fetched listing with {} images", images.len());
        Ok(images)
    }
}

async fn status_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    ClientError::Status { status, message }
}
