use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Base64 form of a re-encoded upload, ready for the model API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedImagePayload {
    pub base64: String,
    pub mime: String,
}

impl EncodedImagePayload {
    /// Inline data URL as expected by the chat-completion image part.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// Decode an uploaded jpg/jpeg/png and re-encode it as baseline JPEG at
/// default quality for transport.
///
/// Undecodable bytes fail the whole request; there is no fallback path.
/// Input size is not capped here.
pub fn encode_image(bytes: &[u8]) -> Result<EncodedImagePayload> {
    let decoded = image::load_from_memory(bytes)?;

    // JPEG carries no alpha channel, so flatten before re-encoding.
    let mut buffer = Vec::new();
    decoded
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;

    debug!(
        raw_bytes = bytes.len(),
        jpeg_bytes = buffer.len(),
        "re-encoded upload for transport"
    );

    Ok(EncodedImagePayload {
        base64: STANDARD.encode(&buffer),
        mime: "image/jpeg".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn round_trips_a_valid_png_to_decodable_jpeg() {
        let payload = encode_image(&png_fixture(64, 48)).unwrap();
        assert_eq!(payload.mime, "image/jpeg");

        let jpeg = STANDARD.decode(&payload.base64).unwrap();
        let reloaded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(reloaded.width(), 64);
        assert_eq!(reloaded.height(), 48);
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            ImageFormat::Jpeg,
            "re-encode must produce JPEG regardless of input format"
        );
    }

    #[test]
    fn flattens_alpha_before_jpeg_encode() {
        let img = image::DynamicImage::new_rgba8(16, 16);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        assert!(encode_image(&png).is_ok());
    }

    #[test]
    fn rejects_undecodable_bytes() {
        let err = encode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalyzerError::ImageDecode(_)));
    }

    #[test]
    fn data_url_carries_mime_and_payload() {
        let payload = EncodedImagePayload {
            base64: "aGVsbG8=".to_string(),
            mime: "image/jpeg".to_string(),
        };
        assert_eq!(payload.data_url(), "data:image/jpeg;base64,aGVsbG8=");
    }
}
