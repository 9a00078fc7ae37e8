use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{error::ApplicationError, repositories::ImageRepository},
    domain::{
        models::{
            file::{
                disambiguated_name, sanitize_filename, stored_name, StoredFile, UploadPayload,
                MAX_UPLOAD_SIZE,
            },
            image::{extension_of, ImageFormat},
        },
        sniff::sniff_content_type,
    },
};

/// Sniffed types accepted for raster uploads. Detection is inconsistent
/// across platforms, so text and octet-stream results are tolerated.
pub const ACCEPTED_CONTENT_TYPES: [&str; 11] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/svg+xml",
    "text/plain",
    "application/octet-stream",
    "text/xml",
    "application/xml",
];

/// The plain name plus a few tokenised retries.
const MAX_NAME_ATTEMPTS: u32 = 4;

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

fn unique_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(13);
    token
}

pub struct UploadService {
    repository: Arc<dyn ImageRepository>,
    max_size: u64,
    clock: fn() -> i64,
}

impl UploadService {
    pub fn new(repository: Arc<dyn ImageRepository>) -> Self {
        Self {
            repository,
            max_size: MAX_UPLOAD_SIZE,
            clock: unix_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Directory checks that run before the request body is looked at.
    pub async fn prepare_storage(&self) -> Result<(), ApplicationError> {
        self.repository.prepare().await?;
        self.repository.ensure_writable().await
    }

    pub async fn upload(&self, payload: UploadPayload) -> Result<StoredFile, ApplicationError> {
        if !payload.validate_size(self.max_size) {
            warn!(
                "Rejected '{}': {} bytes exceeds {}",
                payload.filename,
                payload.size(),
                self.max_size
            );
            return Err(ApplicationError::ValidationFailure(format!(
                "File too large (max. {}MB)",
                self.max_size / (1024 * 1024)
            )));
        }

        let format = validate_content(&payload)?;

        let sanitized = sanitize_filename(&payload.filename);
        let timestamp = (self.clock)();
        let mut filename = stored_name(timestamp, &sanitized);
        let mut attempts = 1;

        while !self.repository.store(&filename, &payload.content).await? {
            if attempts == MAX_NAME_ATTEMPTS {
                return Err(ApplicationError::StorageFailure(format!(
                    "Failed to save file: no free name for '{}'",
                    sanitized
                )));
            }
            debug!("'{}' is taken, retrying with a token", filename);
            filename = disambiguated_name(timestamp, &unique_token(), &sanitized);
            attempts += 1;
        }

        info!(
            "Stored upload '{}' as '{}' ({:?}, {} bytes)",
            payload.filename,
            filename,
            format,
            payload.size()
        );

        Ok(StoredFile {
            filename,
            size: payload.size(),
        })
    }
}

/// Checks extension and content of an upload, returning the matched format.
pub fn validate_content(payload: &UploadPayload) -> Result<ImageFormat, ApplicationError> {
    let extension = extension_of(&payload.filename);
    let format = ImageFormat::from_extension(&extension);

    if let Some(format) = format.filter(ImageFormat::is_vector) {
        if !contains_svg_markup(&payload.content) {
            warn!("Rejected '{}': no SVG markup found", payload.filename);
            return Err(ApplicationError::ValidationFailure(
                "Invalid SVG file - no SVG content found".to_string(),
            ));
        }
        return Ok(format);
    }

    let Some(format) = format else {
        warn!("Rejected '{}': extension '{}' not allowed", payload.filename, extension);
        return Err(ApplicationError::ValidationFailure(format!(
            "Only image files are allowed (extension: {})",
            extension
        )));
    };

    let sniffed = sniff_content_type(&payload.content);
    let accepted = ACCEPTED_CONTENT_TYPES.contains(&sniffed)
        || (format.is_jpeg() && sniffed.contains("image"));

    if !accepted {
        warn!(
            "Rejected '{}': sniffed type '{}' for extension '{}' (declared {:?})",
            payload.filename, sniffed, extension, payload.declared_type
        );
        return Err(ApplicationError::ValidationFailure(format!(
            "Only image files are allowed (MIME type: {}, extension: {})",
            sniffed, extension
        )));
    }

    Ok(format)
}

fn contains_svg_markup(content: &[u8]) -> bool {
    contains(content, b"<svg") || contains(content, b"<?xml")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
