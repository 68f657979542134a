//! Linestack stacks video screenshots into tall subtitle-strip composites.
//!
//! The first image of a run is a keyframe shown in full; the rest are usually subtitle-only
//! shots cropped down to their caption band. Everything is scaled to a fixed output width,
//! optionally separated by gap bands, watermarked and written as one or more JPEGs that each
//! stay under a per-width height ceiling.
//!
//! - Describe inputs with [`ImageRecord`], [`GlobalCrop`] and [`ExportSettings`]
//! - Preview the result with [`assess_export`] (metadata only)
//! - Produce files with [`compose`] and [`write_outputs`]
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
/// JPEG encoding and output naming.
pub mod encode;
pub mod layout;
pub mod model;
/// Segment painting and watermarking.
pub mod render;
pub mod session;

pub use crate::foundation::core::{
    DEFAULT_JPEG_QUALITY, GAP_HEIGHT_PX, MAX_IMAGES, OutputWidth, Rgb8, Role, WATERMARK_MAX_CHARS,
};
pub use crate::foundation::error::{LinestackError, LinestackResult};

pub use crate::assets::source::{BytesSource, FileSource, PixelSource, RasterSource};
pub use crate::encode::files::{DEFAULT_BASENAME, output_file_names, write_outputs};
pub use crate::layout::crop::{CropWindow, resolve_crop};
pub use crate::layout::gaps::plan_gaps;
pub use crate::layout::geometry::{estimate_total_height, scaled_height};
pub use crate::layout::packer::{PackItem, SegmentPlan, pack_segments};
pub use crate::layout::risk::{
    ExportLimits, RiskLevel, RiskReport, WidthLimits, assess_export, assess_risk,
    max_segment_height,
};
pub use crate::model::{
    CropMode, CropSpec, ExportSettings, GlobalCrop, ImageRecord, WatermarkPolicy,
    truncate_watermark,
};
pub use crate::render::watermark::WatermarkStyle;
pub use crate::session::compose::{
    CancelFlag, ComposeOptions, CompositionPlan, EncodedSegment, Progress, Stage, compose,
    compose_with, plan_layout,
};
pub use crate::session::job::{ExportJob, JobImage};
