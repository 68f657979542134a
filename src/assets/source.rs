use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use image::RgbaImage;

use crate::assets::decode::{
    decode_image, decode_image_file, probe_dimensions, probe_file_dimensions,
};

/// Lazily decodable pixel data behind an [`ImageRecord`](crate::ImageRecord).
///
/// `decode` may be called more than once; nothing is cached between calls.
pub trait PixelSource: Send + Sync {
    /// Decode to straight RGBA8.
    fn decode(&self) -> anyhow::Result<RgbaImage>;

    /// Native `(width, height)` without a full decode.
    fn dimensions(&self) -> anyhow::Result<(u32, u32)>;

    /// Short label for logs and debug output.
    fn describe(&self) -> String;
}

/// Image file on disk.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PixelSource for FileSource {
    fn decode(&self) -> anyhow::Result<RgbaImage> {
        decode_image_file(&self.path)
    }

    fn dimensions(&self) -> anyhow::Result<(u32, u32)> {
        probe_file_dimensions(&self.path)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Encoded image bytes held in memory (an upload buffer).
#[derive(Clone)]
pub struct BytesSource {
    bytes: Arc<[u8]>,
}

impl BytesSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for BytesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytesSource")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PixelSource for BytesSource {
    fn decode(&self) -> anyhow::Result<RgbaImage> {
        decode_image(&self.bytes)
    }

    fn dimensions(&self) -> anyhow::Result<(u32, u32)> {
        probe_dimensions(&self.bytes)
    }

    fn describe(&self) -> String {
        format!("bytes:{}", self.bytes.len())
    }
}

/// Already-decoded raster. Decoding hands out a copy.
#[derive(Clone)]
pub struct RasterSource {
    image: Arc<RgbaImage>,
}

impl RasterSource {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

impl fmt::Debug for RasterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSource")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

impl PixelSource for RasterSource {
    fn decode(&self) -> anyhow::Result<RgbaImage> {
        Ok(self.image.as_ref().clone())
    }

    fn dimensions(&self) -> anyhow::Result<(u32, u32)> {
        Ok(self.image.dimensions())
    }

    fn describe(&self) -> String {
        format!("raster:{}x{}", self.image.width(), self.image.height())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
