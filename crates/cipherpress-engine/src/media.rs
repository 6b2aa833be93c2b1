use base64::Engine;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("image source is empty")]
    EmptySource,
    #[error("unsupported image source scheme: {0}")]
    UnsupportedScheme(String),
    #[error("image source is not a plausible URL")]
    MalformedUrl,
    #[error("malformed data URL")]
    MalformedDataUrl,
    #[error("data URL payload is not valid base64")]
    UndecodableData,
    #[error("decoded bytes are not a recognized image format")]
    UnknownFormat,
}

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(?<mime>[a-z]+/[a-z0-9.+-]+)?(?<b64>;base64)?,(?<payload>.*)$")
        .unwrap_or_else(|e| panic!("data URL pattern failed to compile: {e}"))
});

/// Check that an image source will yield readable image bytes.
///
/// Embedded `data:` URLs are decoded and their bytes sniffed against known
/// image signatures. Remote `http(s)` sources can only be shape-checked
/// here; fetching them is the renderer's job.
pub fn validate_image_source(src: &str) -> Result<(), MediaError> {
    let src = src.trim();
    if src.is_empty() {
        return Err(MediaError::EmptySource);
    }

    if src.starts_with("data:") {
        let caps = DATA_URL.captures(src).ok_or(MediaError::MalformedDataUrl)?;
        if caps.name("b64").is_none() {
            // Only base64 payloads carry binary image data.
            return Err(MediaError::MalformedDataUrl);
        }
        let payload = caps.name("payload").map(|m| m.as_str()).unwrap_or("");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| MediaError::UndecodableData)?;
        let mime = caps.name("mime").map(|m| m.as_str());
        return sniff_image_bytes(&bytes, mime);
    }

    if src.starts_with("http://") || src.starts_with("https://") {
        let after_scheme = src.split_once("://").map(|(_, r)| r).unwrap_or("");
        if after_scheme.is_empty() || src.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MediaError::MalformedUrl);
        }
        return Ok(());
    }

    let scheme = src.split(':').next().unwrap_or(src);
    Err(MediaError::UnsupportedScheme(scheme.to_string()))
}

/// Match decoded bytes against known image signatures.
fn sniff_image_bytes(bytes: &[u8], mime: Option<&str>) -> Result<(), MediaError> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n")
        || bytes.starts_with(b"\xff\xd8\xff")
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || bytes.starts_with(b"BM")
        || (bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
    {
        return Ok(());
    }
    // SVG is text; accept when the declared type matches and the markup
    // actually contains an svg root.
    if mime == Some("image/svg+xml")
        && let Ok(text) = std::str::from_utf8(bytes)
        && text.contains("<svg")
    {
        return Ok(());
    }
    Err(MediaError::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn data_url(mime: &str, bytes: &[u8]) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{mime};base64,{payload}")
    }

    #[test]
    fn accepts_png_data_url() {
        assert_eq!(
            validate_image_source(&data_url("image/png", PNG_HEADER)),
            Ok(())
        );
    }

    #[test]
    fn accepts_jpeg_and_gif_signatures() {
        assert_eq!(
            validate_image_source(&data_url("image/jpeg", b"\xff\xd8\xff\xe0rest")),
            Ok(())
        );
        assert_eq!(
            validate_image_source(&data_url("image/gif", b"GIF89a....")),
            Ok(())
        );
    }

    #[test]
    fn accepts_svg_with_declared_type() {
        assert_eq!(
            validate_image_source(&data_url("image/svg+xml", b"<svg xmlns='x'></svg>")),
            Ok(())
        );
    }

    #[test]
    fn rejects_undeclared_svg_text() {
        assert_eq!(
            validate_image_source(&data_url("text/plain", b"<svg></svg>")),
            Err(MediaError::UnknownFormat)
        );
    }

    #[test]
    fn rejects_bytes_without_image_signature() {
        assert_eq!(
            validate_image_source(&data_url("image/png", b"definitely not an image")),
            Err(MediaError::UnknownFormat)
        );
    }

    #[test]
    fn rejects_invalid_base64_payload() {
        assert_eq!(
            validate_image_source("data:image/png;base64,!!!not-base64!!!"),
            Err(MediaError::UndecodableData)
        );
    }

    #[test]
    fn rejects_data_url_without_base64_marker() {
        assert_eq!(
            validate_image_source("data:image/png,rawbytes"),
            Err(MediaError::MalformedDataUrl)
        );
    }

    #[test]
    fn accepts_remote_http_urls_by_shape() {
        assert_eq!(
            validate_image_source("https://example.com/shot.png"),
            Ok(())
        );
        assert_eq!(validate_image_source("http://example.com/a"), Ok(()));
    }

    #[test]
    fn rejects_remote_urls_with_whitespace() {
        assert_eq!(
            validate_image_source("https://exa mple.com/a.png"),
            Err(MediaError::MalformedUrl)
        );
        assert_eq!(validate_image_source("https://"), Err(MediaError::MalformedUrl));
    }

    #[test]
    fn rejects_empty_and_foreign_schemes() {
        assert_eq!(validate_image_source(""), Err(MediaError::EmptySource));
        assert_eq!(validate_image_source("   "), Err(MediaError::EmptySource));
        assert_eq!(
            validate_image_source("ftp://example.com/a.png"),
            Err(MediaError::UnsupportedScheme("ftp".to_string()))
        );
    }
}
