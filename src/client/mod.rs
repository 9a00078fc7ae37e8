//! Slideshow client: polls the listing, drives autoplay and uploads files.

pub mod api;
pub mod driver;
pub mod error;
pub mod slideshow;
pub mod uploader;

pub use api::{ImageApi, ListingSource};
pub use driver::{DriverSettings, SlideshowDriver, Snapshot};
pub use error::ClientError;
pub use slideshow::{Command, Slideshow, SyncOutcome, View};
pub use uploader::{ImageUploader, UploadReport, UploadStatus};
