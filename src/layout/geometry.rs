use crate::{
    foundation::core::{GAP_HEIGHT_PX, OutputWidth},
    foundation::error::{LinestackError, LinestackResult},
    layout::{
        crop::{CropWindow, resolve_crop},
        gaps::plan_gaps,
    },
    model::{GlobalCrop, ImageRecord},
};

/// Where one image lands in output space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceGeometry {
    pub window: CropWindow,
    /// Height in output pixels after scaling the window to the output width.
    pub scaled_height: u32,
}

/// `round(crop_height * output_width / native_width)`, rounding halves up, never below one row.
///
/// Integer arithmetic keeps the metadata estimate and the post-decode recomputation identical.
/// A thin crop on a very wide image still occupies a row rather than vanishing.
pub fn scaled_height(crop_height: u32, native_width: u32, output_width: u32) -> u32 {
    debug_assert!(native_width > 0);
    let num = u64::from(crop_height) * u64::from(output_width);
    let den = u64::from(native_width);
    (((2 * num + den) / (2 * den)) as u32).max(1)
}

/// Crop window and scaled height from metadata alone.
pub fn measure(
    record: &ImageRecord,
    global: &GlobalCrop,
    output_width: OutputWidth,
) -> LinestackResult<PieceGeometry> {
    if record.native_width == 0 || record.native_height == 0 {
        return Err(LinestackError::validation(format!(
            "image '{}' has empty dimensions {}x{}",
            record.id, record.native_width, record.native_height
        )));
    }
    let window = resolve_crop(record, global)?;
    Ok(PieceGeometry {
        window,
        scaled_height: scaled_height(window.height, record.native_width, output_width.px()),
    })
}

pub fn measure_all(
    images: &[ImageRecord],
    global: &GlobalCrop,
    output_width: OutputWidth,
) -> LinestackResult<Vec<PieceGeometry>> {
    images
        .iter()
        .map(|r| measure(r, global, output_width))
        .collect()
}

/// Sum of scaled heights plus one gap band per `true` flag.
pub fn stacked_height(scaled_heights: impl IntoIterator<Item = u32>, gaps: &[bool]) -> u64 {
    let images: u64 = scaled_heights.into_iter().map(u64::from).sum();
    let bands = gaps.iter().filter(|g| **g).count() as u64;
    images + bands * u64::from(GAP_HEIGHT_PX)
}

/// Pre-export estimate of the full composite height. Metadata only, nothing is decoded.
pub fn estimate_total_height(
    images: &[ImageRecord],
    global: &GlobalCrop,
    output_width: OutputWidth,
    enable_gap: bool,
) -> LinestackResult<u64> {
    let pieces = measure_all(images, global, output_width)?;
    let roles: Vec<_> = images.iter().map(|r| r.role).collect();
    let gaps = plan_gaps(&roles, enable_gap);
    Ok(stacked_height(
        pieces.iter().map(|p| p.scaled_height),
        &gaps,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
