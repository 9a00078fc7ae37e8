mod listing_service;
mod upload_service;

pub use listing_service::ListingService;
pub use upload_service::{validate_content, UploadService, ACCEPTED_CONTENT_TYPES};
