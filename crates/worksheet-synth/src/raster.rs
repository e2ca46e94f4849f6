//! Raster decoding and encoding helpers

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat};

use crate::types::{Result, SynthError};

/// Decode an image from raw bytes (PNG, JPEG, GIF or WebP)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| SynthError::ImageDecodeFailure(format!("Failed to decode image: {}", e)))
}

/// Decode reference bytes off the async executor
pub async fn decode_reference(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || decode_image(&bytes)).await?
}

/// Decode a `data:` URL or a bare base64 payload into image bytes
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let payload = match url.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                SynthError::ImageDecodeFailure("Data URL has no payload".to_string())
            })?;
            if !header.ends_with(";base64") {
                return Err(SynthError::ImageDecodeFailure(format!(
                    "Unsupported data URL encoding: {}",
                    header
                )));
            }
            data
        }
        None => url,
    };

    BASE64
        .decode(payload.trim())
        .map_err(|e| SynthError::ImageDecodeFailure(format!("Invalid base64 image data: {}", e)))
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| SynthError::ExportFailure(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Inline PNG bytes as a `data:image/png;base64,` URL
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}
