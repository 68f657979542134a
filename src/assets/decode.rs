use std::{io::Cursor, path::Path};

use anyhow::Context;
use image::{ImageReader, RgbaImage};

/// Decode encoded image bytes (jpeg, png, webp, gif) to straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.into_rgba8())
}

pub fn decode_image_file(path: &Path) -> anyhow::Result<RgbaImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image bytes from '{}'", path.display()))?;
    decode_image(&bytes).with_context(|| format!("decode '{}'", path.display()))
}

/// Read `(width, height)` from the header only.
pub fn probe_dimensions(bytes: &[u8]) -> anyhow::Result<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?
        .into_dimensions()
        .context("read image dimensions")
}

pub fn probe_file_dimensions(path: &Path) -> anyhow::Result<(u32, u32)> {
    ImageReader::open(path)
        .with_context(|| format!("open '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("guess image format of '{}'", path.display()))?
        .into_dimensions()
        .with_context(|| format!("read dimensions of '{}'", path.display()))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
