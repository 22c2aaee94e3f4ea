//! Image loading, transport decoding and PNG encoding.
//!
//! Images reach the pipeline either as files or as base64 payloads, optionally wrapped
//! in a `data:image/...;base64,` URL. Artifacts (mask, diagnostic image, overlay) leave
//! it as PNG, optionally base64 encoded.

use std::io::Cursor;
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageBuffer, ImageFormat, Pixel, PixelWithColorType, RgbImage};

use crate::core::{OCRError, ProcessingStage};

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Decodes an in-memory encoded image (PNG, JPEG) to RgbImage.
pub fn load_image_from_memory(bytes: &[u8]) -> Result<RgbImage, OCRError> {
    let img = image::load_from_memory(bytes).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Extracts the base64 body of a payload.
///
/// A `data:image/<type>;base64,` prefix is stripped when present. Line breaks and other
/// whitespace are removed and missing `=` padding is restored.
pub fn base64_body(payload: &str) -> Result<String, OCRError> {
    let trimmed = payload.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (media, body) = rest.split_once(',').ok_or_else(|| {
                OCRError::decode_error("data URL has no ',' separating header and body")
            })?;
            let is_image = media.starts_with("image/") && media.ends_with(";base64");
            if !is_image {
                return Err(OCRError::decode_error(format!(
                    "expected a base64 image data URL, got header 'data:{}'",
                    media
                )));
            }
            body
        }
        None => trimmed,
    };

    let mut cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(OCRError::decode_error("payload is empty"));
    }
    while cleaned.len() % 4 != 0 {
        cleaned.push('=');
    }
    Ok(cleaned)
}

/// Decodes a base64 image payload or `data:` URL to RgbImage.
///
/// # Errors
///
/// `OCRError::Decode` when the payload is not valid base64 (or not an image data URL),
/// `OCRError::ImageLoad` when the decoded bytes are not a supported image.
pub fn decode_data_url(payload: &str) -> Result<RgbImage, OCRError> {
    let body = base64_body(payload)?;
    let bytes = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| OCRError::decode_error(format!("invalid base64 payload: {}", e)))?;
    load_image_from_memory(&bytes)
}

/// Encodes an 8-bit image as PNG.
pub fn encode_png<P>(image: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<u8>, OCRError>
where
    P: Pixel<Subpixel = u8> + PixelWithColorType,
{
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| OCRError::processing_error(ProcessingStage::Encoding, "encoding PNG", e))?;
    Ok(buf)
}

/// Encodes an 8-bit image as base64 PNG (without a `data:` prefix).
pub fn encode_png_base64<P>(image: &ImageBuffer<P, Vec<u8>>) -> Result<String, OCRError>
where
    P: Pixel<Subpixel = u8> + PixelWithColorType,
{
    Ok(STANDARD.encode(encode_png(image)?))
}

/// Encodes an 8-bit image as a `data:image/png;base64,` URL.
pub fn encode_png_data_url<P>(image: &ImageBuffer<P, Vec<u8>>) -> Result<String, OCRError>
where
    P: Pixel<Subpixel = u8> + PixelWithColorType,
{
    Ok(format!("data:image/png;base64,{}", encode_png_base64(image)?))
}
