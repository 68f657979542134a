use std::{
    ops::Range,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::{
    foundation::core::{GAP_HEIGHT_PX, OutputWidth, Role},
    foundation::error::{LinestackError, LinestackResult},
    layout::{
        crop::{CropWindow, crop_window, effective_crop_spec},
        gaps::plan_gaps,
        geometry::{scaled_height, stacked_height},
        packer::{PackItem, SegmentPlan, pack_segments},
        risk::{ExportLimits, RiskLevel},
    },
    model::{ExportSettings, GlobalCrop, ImageRecord},
    render::{
        canvas::{RenderPiece, SegmentStyle, render_segment},
        watermark::{WatermarkRasterizer, WatermarkStyle},
    },
};

/// Coarse phase of a composition run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Decoding,
    Planning,
    Rendering,
    Done,
}

impl Stage {
    /// User-facing label for a progress bar.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Validating => "Preparing...",
            Stage::Decoding => "Processing images...",
            Stage::Planning => "Composing...",
            Stage::Rendering => "Exporting...",
            Stage::Done => "Done!",
        }
    }
}

/// One progress notification. `percent` never decreases within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub stage: Stage,
}

/// Cooperative cancellation, checked between images and between segments.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs that sit outside [`ExportSettings`] and rarely change.
#[derive(Clone, Debug)]
pub struct ComposeOptions {
    pub limits: ExportLimits,
    pub watermark_style: WatermarkStyle,
    /// Extra font directory loaded into the watermark font database.
    pub fonts_dir: Option<PathBuf>,
    /// Whether installed system fonts are loaded as well.
    pub system_fonts: bool,
    pub cancel: Option<CancelFlag>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            limits: ExportLimits::default(),
            watermark_style: WatermarkStyle::default(),
            fonts_dir: None,
            system_fonts: true,
            cancel: None,
        }
    }
}

impl ComposeOptions {
    fn check_cancelled(&self) -> LinestackResult<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(LinestackError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// One exported JPEG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSegment {
    pub index: usize,
    /// Input positions stacked into this file.
    pub images: Range<usize>,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl AsRef<[u8]> for EncodedSegment {
    fn as_ref(&self) -> &[u8] {
        &self.jpeg
    }
}

/// Layout computed from post-decode geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionPlan {
    pub gaps: Vec<bool>,
    pub total_height: u64,
    pub risk: RiskLevel,
    pub segments: Vec<SegmentPlan>,
}

/// Plan gap bands, total height, risk tier and segments for images in stacking order.
pub fn plan_layout(
    roles: &[Role],
    scaled_heights: &[u32],
    enable_gap: bool,
    width: OutputWidth,
    limits: &ExportLimits,
) -> CompositionPlan {
    debug_assert_eq!(roles.len(), scaled_heights.len());
    let gaps = plan_gaps(roles, enable_gap);
    let total_height = stacked_height(scaled_heights.iter().copied(), &gaps);
    let items: Vec<PackItem> = scaled_heights
        .iter()
        .zip(&gaps)
        .map(|(&height, &gap_before)| PackItem { height, gap_before })
        .collect();
    let segments = pack_segments(&items, limits.max_segment_height(width), GAP_HEIGHT_PX);
    CompositionPlan {
        gaps,
        total_height,
        risk: limits.assess_risk(total_height, width),
        segments,
    }
}

struct DecodedPiece {
    image_id: String,
    role: Role,
    window: CropWindow,
    scaled_height: u32,
    bitmap: Option<RgbaImage>,
}

impl DecodedPiece {
    fn release(&mut self) {
        if let Some(bitmap) = self.bitmap.take() {
            trace!(
                image = %self.image_id,
                bytes = bitmap.as_raw().len(),
                "released bitmap"
            );
        }
    }
}

/// Compose with default options.
pub fn compose(
    images: &[ImageRecord],
    global: &GlobalCrop,
    settings: &ExportSettings,
    on_progress: impl FnMut(Progress),
) -> LinestackResult<Vec<EncodedSegment>> {
    compose_with(images, global, settings, &ComposeOptions::default(), on_progress)
}

/// Validate, decode, plan, render and encode. Returns one JPEG per segment, top to bottom.
#[tracing::instrument(
    skip_all,
    fields(images = images.len(), width = %settings.output_width, gap = settings.enable_gap)
)]
pub fn compose_with(
    images: &[ImageRecord],
    global: &GlobalCrop,
    settings: &ExportSettings,
    opts: &ComposeOptions,
    mut on_progress: impl FnMut(Progress),
) -> LinestackResult<Vec<EncodedSegment>> {
    run(images, global, settings, opts, &mut on_progress)
        .inspect_err(|e| warn!(error = %e, "composition failed"))
}

fn run(
    images: &[ImageRecord],
    global: &GlobalCrop,
    settings: &ExportSettings,
    opts: &ComposeOptions,
    on_progress: &mut dyn FnMut(Progress),
) -> LinestackResult<Vec<EncodedSegment>> {
    let mut last = 0u8;
    let mut report = |stage: Stage, percent: u8| {
        last = last.max(percent);
        on_progress(Progress {
            percent: last,
            stage,
        });
    };

    report(Stage::Validating, 0);
    validate_input(images, settings, &opts.limits)?;

    let width = settings.output_width;
    let n = images.len();
    let mut pieces = Vec::with_capacity(n);
    for (i, record) in images.iter().enumerate() {
        opts.check_cancelled()?;
        pieces.push(decode_piece(record, global, width)?);
        report(Stage::Decoding, phase_percent(i + 1, n, 0, 50));
    }
    opts.check_cancelled()?;

    let roles: Vec<Role> = pieces.iter().map(|p| p.role).collect();
    let heights: Vec<u32> = pieces.iter().map(|p| p.scaled_height).collect();
    let plan = plan_layout(&roles, &heights, settings.enable_gap, width, &opts.limits);
    info!(
        total_height = plan.total_height,
        risk = %plan.risk,
        segments = plan.segments.len(),
        "planned composition"
    );
    report(Stage::Planning, 55);

    let watermark = match settings.watermark() {
        Some(text) => {
            let rasterizer = WatermarkRasterizer::new(
                opts.watermark_style.clone(),
                opts.fonts_dir.as_deref(),
                opts.system_fonts,
            );
            let layer = rasterizer.rasterize(text, width.px())?;
            if layer.is_blank() {
                return Err(LinestackError::render(format!(
                    "no usable font for watermark \"{text}\""
                )));
            }
            Some(layer)
        }
        None => None,
    };
    let style = SegmentStyle {
        output_width: width.px(),
        gap_color: settings.gap_color,
        gap_height: GAP_HEIGHT_PX,
        watermark: watermark.as_ref(),
        watermark_policy: settings.watermark_policy,
        jpeg_quality: settings.jpeg_quality,
    };
    report(Stage::Rendering, 60);

    let m = plan.segments.len();
    let mut out = Vec::with_capacity(m);
    for (k, segment) in plan.segments.iter().enumerate() {
        opts.check_cancelled()?;
        let jpeg = {
            let render_pieces = render_pieces(&pieces, segment)?;
            render_segment(k, &render_pieces, segment.height, &style, k + 1 == m)?
        };
        for piece in &mut pieces[segment.range.clone()] {
            piece.release();
        }
        out.push(EncodedSegment {
            index: k,
            images: segment.range.clone(),
            width: width.px(),
            height: segment.height,
            jpeg,
        });
        report(Stage::Rendering, phase_percent(k + 1, m, 60, 95));
    }

    report(Stage::Done, 100);
    Ok(out)
}

fn validate_input(
    images: &[ImageRecord],
    settings: &ExportSettings,
    limits: &ExportLimits,
) -> LinestackResult<()> {
    let first = images.first().ok_or(LinestackError::EmptyInput)?;
    if !first.role.is_keyframe() {
        return Err(LinestackError::InvalidFirstImage { role: first.role });
    }
    settings.validate()?;
    limits.validate()
}

/// Resolve the crop from metadata, decode, then re-derive geometry from the decoded bitmap.
fn decode_piece(
    record: &ImageRecord,
    global: &GlobalCrop,
    width: OutputWidth,
) -> LinestackResult<DecodedPiece> {
    let spec = effective_crop_spec(record, global);
    crop_window(record.role, &spec, record.native_height)
        .map_err(|reason| LinestackError::invalid_crop(&record.id, reason))?;

    let bitmap = record
        .source
        .decode()
        .map_err(|e| LinestackError::decode(&record.id, format!("{e:#}")))?;
    let (w, h) = bitmap.dimensions();
    if (w, h) != (record.native_width, record.native_height) {
        return Err(LinestackError::DimensionMismatch {
            image_id: record.id.clone(),
            expected: (record.native_width, record.native_height),
            actual: (w, h),
        });
    }

    let window = crop_window(record.role, &spec, h)
        .map_err(|reason| LinestackError::invalid_crop(&record.id, reason))?;
    let scaled = scaled_height(window.height, w, width.px());
    debug!(
        image = %record.id,
        role = %record.role,
        origin_y = window.origin_y,
        crop_height = window.height,
        scaled_height = scaled,
        "decoded image"
    );
    Ok(DecodedPiece {
        image_id: record.id.clone(),
        role: record.role,
        window,
        scaled_height: scaled,
        bitmap: Some(bitmap),
    })
}

fn render_pieces<'a>(
    pieces: &'a [DecodedPiece],
    segment: &SegmentPlan,
) -> LinestackResult<Vec<RenderPiece<'a>>> {
    pieces[segment.range.clone()]
        .iter()
        .zip(&segment.gaps)
        .map(|(piece, &gap_before)| {
            let bitmap = piece.bitmap.as_ref().ok_or_else(|| {
                LinestackError::render(format!("bitmap for '{}' already released", piece.image_id))
            })?;
            Ok(RenderPiece {
                image_id: &piece.image_id,
                bitmap,
                window: piece.window,
                scaled_height: piece.scaled_height,
                gap_before,
            })
        })
        .collect()
}

/// `from + round((to - from) * done / total)`.
fn phase_percent(done: usize, total: usize, from: u8, to: u8) -> u8 {
    if total == 0 {
        return to;
    }
    let span = (to - from) as usize;
    from + ((2 * span * done + total) / (2 * total)).min(span) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/session/compose.rs"]
mod tests;
