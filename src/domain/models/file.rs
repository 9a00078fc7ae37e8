use serde::Serialize;

/// Upper bound for a single uploaded file, in bytes.
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// One file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub content: Vec<u8>,
    pub filename: String,
    pub declared_type: Option<String>,
}

impl UploadPayload {
    pub fn new(content: Vec<u8>, filename: String, declared_type: Option<String>) -> Self {
        Self {
            content,
            filename,
            declared_type,
        }
    }

    pub fn validate_size(&self, max_size: u64) -> bool {
        self.size() <= max_size
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
///
/// The extension part is lower-cased so that the stored name always carries
/// the same extension the validator matched against.
pub fn sanitize_filename(filename: &str) -> String {
    let safe = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();

    match safe.rsplit_once('.') {
        Some((stem, extension)) => format!("{}.{}", stem, extension.to_ascii_lowercase()),
        None => safe,
    }
}

/// `<unix-seconds>_<name>`
pub fn stored_name(timestamp: i64, sanitized: &str) -> String {
    format!("{}_{}", timestamp, sanitized)
}

/// `<unix-seconds>_<token>_<name>`, used when the plain name is taken.
pub fn disambiguated_name(timestamp: i64, token: &str, sanitized: &str) -> String {
    format!("{}_{}_{}", timestamp, token, sanitized)
}
