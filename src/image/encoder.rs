use super::ImageEncoder;
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use image::ImageFormat;

/// Reads local images and encodes them as `data:<mime>;base64,...` URIs.
///
/// `http://`, `https://` and `data:` references are passed through untouched.
#[derive(Debug, Default, Clone)]
pub struct DataUriEncoder;

impl DataUriEncoder {
    pub fn new() -> Self {
        Self
    }

    fn is_passthrough(reference: &str) -> bool {
        reference.starts_with("http://")
            || reference.starts_with("https://")
            || reference.starts_with("data:")
    }

    /// Encode raw image bytes, detecting the format from their signature.
    pub fn encode_bytes(bytes: &[u8]) -> Result<String> {
        let format = image::guess_format(bytes)?;
        Ok(Self::data_uri(bytes, format))
    }

    fn data_uri(bytes: &[u8], format: ImageFormat) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{};base64,{}", format.to_mime_type(), encoded)
    }
}

#[async_trait]
impl ImageEncoder for DataUriEncoder {
    async fn encode(&self, reference: &str) -> Result<String> {
        if Self::is_passthrough(reference) {
            return Ok(reference.to_string());
        }

        let bytes = tokio::fs::read(reference).await.map_err(|e| {
            tracing::error!("Failed to read image {}: {}", reference, e);
            e
        })?;
        tracing::debug!("Encoding image {} ({} bytes)", reference, bytes.len());

        Self::encode_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_bytes() {
        let uri = DataUriEncoder::encode_bytes(&PNG_HEADER).unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_encode_jpeg_bytes() {
        let uri = DataUriEncoder::encode_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_unknown_bytes_are_rejected() {
        let err = DataUriEncoder::encode_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[tokio::test]
    async fn test_urls_pass_through() {
        let encoder = DataUriEncoder::new();
        for reference in [
            "https://example.com/cat.jpg",
            "http://example.com/cat.jpg",
            "data:image/png;base64,AAAA",
        ] {
            assert_eq!(encoder.encode(reference).await.unwrap(), reference);
        }
    }

    #[tokio::test]
    async fn test_encode_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, PNG_HEADER).unwrap();

        let uri = DataUriEncoder::new()
            .encode(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");

        let err = DataUriEncoder::new()
            .encode(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
