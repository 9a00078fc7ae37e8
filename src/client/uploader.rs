use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, warn};

use crate::{
    client::{
        api::{ImageApi, ListingSource},
        error::ClientError,
    },
    domain::models::image::{extension_of, ImageFormat},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploaded { stored_name: String },
    Failed { reason: String },
}

/// Result for one file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub file: String,
    pub status: UploadStatus,
}

impl UploadReport {
    pub fn is_uploaded(&self) -> bool {
        matches!(self.status, UploadStatus::Uploaded { .. })
    }
}

/// Type the picker would report for a local file, if it is an image.
pub fn image_type_of(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    ImageFormat::from_extension(&extension_of(name)).map(|format| format.mime_type())
}

pub struct ImageUploader {
    api: Arc<ImageApi>,
}

impl ImageUploader {
    pub fn new(api: Arc<ImageApi>) -> Self {
        Self { api }
    }

    /// Uploads the image files among `paths`, one request per file.
    ///
    /// Non-image files are dropped from the selection; a selection without
    /// any image is an error. A failed file is recorded and the batch goes on.
    pub async fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<UploadReport>, ClientError> {
        let selection: Vec<(&PathBuf, &'static str)> = paths
            .iter()
            .filter_map(|path| image_type_of(path).map(|mime| (path, mime)))
            .collect();

        if selection.is_empty() {
            return Err(ClientError::NoImageFiles);
        }

        let total = selection.len();
        let mut reports = Vec::with_capacity(total);

        for (index, (path, mime_type)) in selection.into_iter().enumerate() {
            let report = self.upload_one(path, mime_type).await;
            match &report.status {
                UploadStatus::Uploaded { stored_name } => {
                    info!("Uploaded {} as {}", report.file, stored_name)
                }
                UploadStatus::Failed { reason } => warn!("Upload of {} failed: {}", report.file, reason),
            }
            info!(
                "Upload progress {}/{} ({}%)",
                index + 1,
                total,
                (index + 1) * 100 / total
            );
            reports.push(report);
        }

        let uploaded = reports.iter().filter(|r| r.is_uploaded()).count();
        info!("{} of {} image(s) uploaded", uploaded, total);

        Ok(reports)
    }

    /// Files already on the server, newest first.
    pub async fn existing_files(&self) -> Result<Vec<String>, ClientError> {
        self.api.fetch_listing().await
    }

    async fn upload_one(&self, path: &Path, mime_type: &str) -> UploadReport {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let status = match self.send(path, &file, mime_type).await {
            Ok(stored_name) => UploadStatus::Uploaded { stored_name },
            Err(e) => UploadStatus::Failed {
                reason: e.to_string(),
            },
        };

        UploadReport { file, status }
    }

    async fn send(&self, path: &Path, file: &str, mime_type: &str) -> Result<String, ClientError> {
        let content = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let response = self.api.upload(file, content, mime_type).await?;
        Ok(response.filename)
    }
}
