//! Input value objects handed to the composition pipeline.
//!
//! Everything here is an immutable snapshot: the pipeline never reaches back into whatever
//! state container produced it.

use std::{fmt, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    assets::source::{FileSource, PixelSource},
    foundation::core::{DEFAULT_JPEG_QUALITY, OutputWidth, Rgb8, Role, WATERMARK_MAX_CHARS},
    foundation::error::{LinestackError, LinestackResult},
};

/// Which vertical slice of a subtitle-only image to keep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CropSpec {
    /// Keep the bottom `bottom_percent`% of the image, `(0, 100]`.
    BottomRatio { bottom_percent: f64 },
    /// Keep an explicit window, both ratios in `[0, 1]` and `top_ratio + height_ratio <= 1`.
    #[serde(alias = "drag")]
    Window { top_ratio: f64, height_ratio: f64 },
}

impl CropSpec {
    /// Built-in fallback: keep the bottom 20%.
    pub const DEFAULT: CropSpec = CropSpec::BottomRatio {
        bottom_percent: 20.0,
    };

    pub fn bottom(percent: f64) -> Self {
        CropSpec::BottomRatio {
            bottom_percent: percent,
        }
    }

    pub fn window(top_ratio: f64, height_ratio: f64) -> Self {
        CropSpec::Window {
            top_ratio,
            height_ratio,
        }
    }
}

impl Default for CropSpec {
    fn default() -> Self {
        CropSpec::DEFAULT
    }
}

/// Per-image crop override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropMode {
    #[default]
    InheritGlobal,
    Custom(CropSpec),
}

/// Crop shared by every subtitle-only image without a custom override.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalCrop {
    pub enabled: bool,
    pub spec: CropSpec,
}

impl Default for GlobalCrop {
    fn default() -> Self {
        Self {
            enabled: true,
            spec: CropSpec::DEFAULT,
        }
    }
}

/// One source screenshot in stacking order.
#[derive(Clone)]
pub struct ImageRecord {
    pub id: String,
    pub source: Arc<dyn PixelSource>,
    /// Width from file metadata; must equal the decoded width.
    pub native_width: u32,
    /// Height from file metadata; must equal the decoded height.
    pub native_height: u32,
    pub role: Role,
    pub crop_mode: CropMode,
}

impl ImageRecord {
    pub fn new(
        id: impl Into<String>,
        source: Arc<dyn PixelSource>,
        native_width: u32,
        native_height: u32,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            native_width,
            native_height,
            role,
            crop_mode: CropMode::InheritGlobal,
        }
    }

    /// Build a record whose dimensions come from the source's header (no full decode).
    pub fn from_source(
        id: impl Into<String>,
        source: Arc<dyn PixelSource>,
        role: Role,
    ) -> LinestackResult<Self> {
        let id = id.into();
        let (w, h) = source
            .dimensions()
            .map_err(|e| LinestackError::decode(&id, format!("{e:#}")))?;
        Ok(Self::new(id, source, w, h, role))
    }

    pub fn from_path(
        id: impl Into<String>,
        path: impl AsRef<Path>,
        role: Role,
    ) -> LinestackResult<Self> {
        let source = Arc::new(FileSource::new(path.as_ref()));
        Self::from_source(id, source, role)
    }

    pub fn with_crop_mode(mut self, crop_mode: CropMode) -> Self {
        self.crop_mode = crop_mode;
        self
    }

    pub fn with_custom_crop(self, spec: CropSpec) -> Self {
        self.with_crop_mode(CropMode::Custom(spec))
    }
}

impl fmt::Debug for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRecord")
            .field("id", &self.id)
            .field("source", &self.source.describe())
            .field("native_width", &self.native_width)
            .field("native_height", &self.native_height)
            .field("role", &self.role)
            .field("crop_mode", &self.crop_mode)
            .finish()
    }
}

/// Which segments of a multi-file export carry the watermark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPolicy {
    /// Every exported file is stamped so each one stands alone.
    #[default]
    EverySegment,
    /// Only the final file is stamped.
    LastSegment,
}

impl WatermarkPolicy {
    pub fn applies_to(self, is_last_segment: bool) -> bool {
        match self {
            WatermarkPolicy::EverySegment => true,
            WatermarkPolicy::LastSegment => is_last_segment,
        }
    }
}

/// Export settings, fixed for the duration of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub output_width: OutputWidth,
    pub enable_gap: bool,
    pub gap_color: Rgb8,
    /// Empty means no watermark.
    pub watermark_text: String,
    pub watermark_policy: WatermarkPolicy,
    /// In `(0, 1]`.
    pub jpeg_quality: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_width: OutputWidth::W720,
            enable_gap: false,
            gap_color: Rgb8::WHITE,
            watermark_text: String::new(),
            watermark_policy: WatermarkPolicy::EverySegment,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> LinestackResult<()> {
        if !self.jpeg_quality.is_finite() || self.jpeg_quality <= 0.0 || self.jpeg_quality > 1.0
        {
            return Err(LinestackError::validation(format!(
                "jpeg_quality must be in (0, 1], got {}",
                self.jpeg_quality
            )));
        }
        let chars = self.watermark_text.chars().count();
        if chars > WATERMARK_MAX_CHARS {
            return Err(LinestackError::validation(format!(
                "watermark is {chars} characters, max is {WATERMARK_MAX_CHARS}"
            )));
        }
        Ok(())
    }

    pub fn watermark(&self) -> Option<&str> {
        let text = self.watermark_text.as_str();
        (!text.is_empty()).then_some(text)
    }
}

/// Clip watermark input to the accepted length, the way the settings form does.
pub fn truncate_watermark(text: &str) -> String {
    text.chars().take(WATERMARK_MAX_CHARS).collect()
}

#[cfg(test)]
#[path = "../tests/unit/model.rs"]
mod tests;
