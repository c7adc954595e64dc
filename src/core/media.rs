pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_WEBP: &str = "image/webp";
pub const IMAGE_GIF: &str = "image/gif";

/// Maps a client-declared MIME type onto one of the media types the model
/// accepts. Case-insensitive substring match, first hit wins; anything
/// unrecognized is declared as JPEG.
pub fn canonical_media_type(declared: &str) -> &'static str {
    let declared = declared.to_ascii_lowercase();
    if declared.contains("png") {
        IMAGE_PNG
    } else if declared.contains("webp") {
        IMAGE_WEBP
    } else if declared.contains("gif") {
        IMAGE_GIF
    } else {
        IMAGE_JPEG
    }
}

/// Identifies the image format from its magic bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(IMAGE_JPEG);
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(IMAGE_PNG);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(IMAGE_GIF);
    }
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return Some(IMAGE_WEBP);
    }
    None
}

/// Chooses the media type to declare for an upload.
///
/// With `sniff_content` off this is [`canonical_media_type`]. With it on, a
/// recognized image signature takes precedence over the declared type.
pub fn resolve_media_type(declared: &str, bytes: &[u8], sniff_content: bool) -> &'static str {
    let from_declared = canonical_media_type(declared);
    if !sniff_content {
        return from_declared;
    }

    match sniff_media_type(bytes) {
        Some(sniffed) => {
            if sniffed != from_declared {
                tracing::warn!(
                    declared = %declared,
                    sniffed,
                    "Declared MIME type does not match image content, using content"
                );
            }
            sniffed
        }
        None => from_declared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn test_canonical_media_type() {
        assert_eq!(canonical_media_type("image/png"), IMAGE_PNG);
        assert_eq!(canonical_media_type("IMAGE/PNG"), IMAGE_PNG);
        assert_eq!(canonical_media_type("image/webp"), IMAGE_WEBP);
        assert_eq!(canonical_media_type("image/gif"), IMAGE_GIF);
        assert_eq!(canonical_media_type("image/jpeg"), IMAGE_JPEG);
        assert_eq!(canonical_media_type("application/octet-stream"), IMAGE_JPEG);
        assert_eq!(canonical_media_type(""), IMAGE_JPEG);
    }

    #[test]
    fn test_priority_order_prefers_png() {
        assert_eq!(canonical_media_type("image/png+webp"), IMAGE_PNG);
        assert_eq!(canonical_media_type("x-webp-gif"), IMAGE_WEBP);
    }

    #[test]
    fn test_sniff_media_type() {
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(IMAGE_JPEG));
        assert_eq!(sniff_media_type(PNG_HEADER), Some(IMAGE_PNG));
        assert_eq!(sniff_media_type(b"GIF89a\x01\x00"), Some(IMAGE_GIF));
        assert_eq!(sniff_media_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some(IMAGE_WEBP));
        assert_eq!(sniff_media_type(b"%PDF-1.7"), None);
        assert_eq!(sniff_media_type(&[]), None);
    }

    #[test]
    fn test_resolve_ignores_content_unless_enabled() {
        assert_eq!(resolve_media_type("image/jpeg", PNG_HEADER, false), IMAGE_JPEG);
        assert_eq!(resolve_media_type("image/jpeg", PNG_HEADER, true), IMAGE_PNG);
        assert_eq!(resolve_media_type("image/gif", b"not an image", true), IMAGE_GIF);
    }
}
