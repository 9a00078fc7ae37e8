//! Content-type detection from leading magic bytes.
//!
//! The result is a MIME string in the shape a libmagic-style detector would
//! report, so callers can compare it against allow-lists and substring
//! checks.

const TEXT_PROBE_LEN: usize = 8 * 1024;

/// Guess the MIME type of a payload from its content.
pub fn sniff_content_type(content: &[u8]) -> &'static str {
    if let Some(mime) = detect_binary(content) {
        return mime;
    }

    if let Some(mime) = detect_markup(content) {
        return mime;
    }

    if looks_like_text(content) {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

fn detect_binary(content: &[u8]) -> Option<&'static str> {
    let mime = match content {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => "image/gif",
        [b'B', b'M', ..] if content.len() >= 14 => "image/bmp",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => "image/tiff",
        [0x00, 0x00, 0x01, 0x00, ..] => "image/vnd.microsoft.icon",
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] => return Some(iso_media_type(brand)),
        [b'%', b'P', b'D', b'F', b'-', ..] => "application/pdf",
        [b'P', b'K', 0x03, 0x04, ..] => "application/zip",
        [0x1F, 0x8B, ..] => "application/gzip",
        [0x7F, b'E', b'L', b'F', ..] => "application/x-executable",
        _ => return None,
    };
    Some(mime)
}

fn iso_media_type(brand: &[u8]) -> &'static str {
    match brand.get(..4) {
        Some(b"avif") | Some(b"avis") => "image/avif",
        Some(b"heic") | Some(b"heix") | Some(b"mif1") => "image/heic",
        _ => "video/mp4",
    }
}

fn detect_markup(content: &[u8]) -> Option<&'static str> {
    let head = &content[..content.len().min(TEXT_PROBE_LEN)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    let lowered = trimmed.to_ascii_lowercase();

    if lowered.starts_with("<svg") || (lowered.starts_with("<?xml") && lowered.contains("<svg")) {
        return Some("image/svg+xml");
    }
    if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
        return Some("text/html");
    }
    if lowered.starts_with("<?xml") {
        return Some("text/xml");
    }
    None
}

fn looks_like_text(content: &[u8]) -> bool {
    let head = &content[..content.len().min(TEXT_PROBE_LEN)];
    if head.is_empty() {
        return false;
    }
    if head.contains(&0) {
        return false;
    }
    // A multi-byte sequence may be cut at the probe boundary.
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
