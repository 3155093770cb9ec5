//! Media type detection for image payloads.
//!
//! Detection prefers magic numbers (via the `infer` crate) over file
//! extensions, since remote paths frequently lie about their contents.
//! Extension mapping is the fallback for paths that were never fetched.

/// Guess a media type by inspecting the leading bytes (magic numbers).
pub fn media_type_from_bytes(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|kind| kind.mime_type().to_string())
}

/// Guess a media type from a path or URL extension.
///
/// Handles query parameters in URLs (`photo.png?v=2`). Returns `None` for
/// unknown extensions; callers must tolerate an unknown media type.
pub fn media_type_from_path(path_or_url: &str) -> Option<String> {
    let extension = path_or_url
        .rsplit('.')
        .next()?
        .split('?')
        .next()?
        .to_lowercase();

    let media_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => return None,
    };

    Some(media_type.to_string())
}

/// Combined guess: prefer bytes, fall back to the extension.
pub fn guess_media_type(bytes: Option<&[u8]>, path_or_url: Option<&str>) -> Option<String> {
    if let Some(b) = bytes
        && let Some(m) = media_type_from_bytes(b)
    {
        return Some(m);
    }
    path_or_url.and_then(media_type_from_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        assert_eq!(
            media_type_from_path("image.jpg"),
            Some("image/jpeg".to_string())
        );
        assert_eq!(
            media_type_from_path("photo.PNG"),
            Some("image/png".to_string())
        );
        assert_eq!(
            media_type_from_path("https://example.com/pic.webp?v=1"),
            Some("image/webp".to_string())
        );
        assert_eq!(media_type_from_path("archive.zip"), None);
        assert_eq!(media_type_from_path("no-extension"), None);
    }

    #[test]
    fn bytes_win_over_extension() {
        // PNG magic numbers with a lying .jpg extension.
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(
            guess_media_type(Some(&png), Some("file.jpg")),
            Some("image/png".to_string())
        );
    }

    #[test]
    fn falls_back_to_extension_then_none() {
        assert_eq!(
            guess_media_type(None, Some("file.gif")),
            Some("image/gif".to_string())
        );
        assert_eq!(guess_media_type(Some(&[0x00, 0x01]), Some("file.xyz")), None);
        assert_eq!(guess_media_type(None, None), None);
    }
}
