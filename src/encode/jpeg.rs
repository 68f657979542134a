use image::{RgbImage, RgbaImage, buffer::ConvertBuffer, codecs::jpeg::JpegEncoder};

use crate::foundation::error::{LinestackError, LinestackResult};

/// Largest width or height a baseline JPEG can describe.
pub const JPEG_MAX_DIMENSION: u32 = 65_535;

/// Map a `(0, 1]` quality to the encoder's `1..=100` scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode an opaque canvas; alpha is dropped.
pub fn encode_jpeg(canvas: &RgbaImage, quality: f32) -> anyhow::Result<Vec<u8>> {
    let rgb: RgbImage = canvas.convert();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality_percent(quality)).encode_image(&rgb)?;
    Ok(out)
}

/// Encode segment `index`, treating an empty result as a failure.
pub fn encode_segment_jpeg(
    index: usize,
    canvas: &RgbaImage,
    quality: f32,
) -> LinestackResult<Vec<u8>> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(LinestackError::encode(index, "canvas has no pixels"));
    }
    let bytes = encode_jpeg(canvas, quality)
        .map_err(|e| LinestackError::encode(index, format!("{e:#}")))?;
    if bytes.is_empty() {
        return Err(LinestackError::encode(index, "encoder returned no data"));
    }
    tracing::debug!(
        segment = index,
        width = canvas.width(),
        height = canvas.height(),
        bytes = bytes.len(),
        "encoded segment"
    );
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/jpeg.rs"]
mod tests;
