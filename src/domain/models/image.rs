use std::time::SystemTime;

use serde::Serialize;

/// Image formats the service stores and lists.
///
/// Upload validation and directory listing both derive their allow-lists
/// from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Svg,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Jpg,
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Bmp,
        ImageFormat::Webp,
        ImageFormat::Svg,
    ];

    /// Matches an already lower-cased extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpg | ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, ImageFormat::Svg)
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self, ImageFormat::Jpg | ImageFormat::Jpeg)
    }

    pub fn allowed_extensions() -> Vec<&'static str> {
        Self::ALL.iter().map(ImageFormat::extension).collect()
    }
}

/// Lower-cased text after the last `.` of a file name, empty when there is none.
pub fn extension_of(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);

    match base.rsplit_once('.') {
        Some((_, extension)) => extension.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// A regular file found in the storage directory.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub modified: SystemTime,
}

impl StoredImage {
    pub fn new(filename: String, modified: SystemTime) -> Self {
        Self { filename, modified }
    }

    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_extension(&extension_of(&self.filename))
    }
}
