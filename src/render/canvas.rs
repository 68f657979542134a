use image::{RgbaImage, imageops};

use crate::{
    encode::jpeg::{JPEG_MAX_DIMENSION, encode_segment_jpeg},
    foundation::core::Rgb8,
    foundation::error::{LinestackError, LinestackResult},
    layout::crop::CropWindow,
    model::WatermarkPolicy,
    render::watermark::WatermarkLayer,
};

/// One image ready to be drawn into a segment.
#[derive(Clone, Copy, Debug)]
pub struct RenderPiece<'a> {
    pub image_id: &'a str,
    pub bitmap: &'a RgbaImage,
    pub window: CropWindow,
    pub scaled_height: u32,
    /// Realized gap band above this piece within its segment.
    pub gap_before: bool,
}

/// Everything about a segment's look that is shared across the run.
#[derive(Clone, Copy, Debug)]
pub struct SegmentStyle<'a> {
    pub output_width: u32,
    pub gap_color: Rgb8,
    pub gap_height: u32,
    pub watermark: Option<&'a WatermarkLayer>,
    pub watermark_policy: WatermarkPolicy,
    pub jpeg_quality: f32,
}

/// Paint the pieces top to bottom onto a `output_width x height` canvas filled with the gap color.
pub fn paint_segment(
    pieces: &[RenderPiece<'_>],
    height: u32,
    style: &SegmentStyle<'_>,
) -> LinestackResult<RgbaImage> {
    let mut canvas = RgbaImage::from_pixel(style.output_width, height, style.gap_color.to_rgba());

    let mut y = 0u32;
    for piece in pieces {
        if piece.gap_before {
            y += style.gap_height;
        }
        if y + piece.scaled_height > height {
            return Err(LinestackError::render(format!(
                "image '{}' ends at row {} past segment height {height}",
                piece.image_id,
                y + piece.scaled_height
            )));
        }
        draw_piece(&mut canvas, piece, y, style.output_width)?;
        y += piece.scaled_height;
    }

    if y != height {
        return Err(LinestackError::render(format!(
            "segment pieces cover {y} rows, planned height is {height}"
        )));
    }
    Ok(canvas)
}

/// Crop the piece's window, scale it to `(width, scaled_height)` and blend it in at row `y`.
fn draw_piece(
    canvas: &mut RgbaImage,
    piece: &RenderPiece<'_>,
    y: u32,
    width: u32,
) -> LinestackResult<()> {
    if piece.scaled_height == 0 {
        return Ok(());
    }
    let (src_w, src_h) = piece.bitmap.dimensions();
    if piece.window.end_y() > src_h || piece.window.height == 0 {
        return Err(LinestackError::render(format!(
            "crop window {:?} outside image '{}' ({src_w}x{src_h})",
            piece.window, piece.image_id
        )));
    }

    let cropped =
        imageops::crop_imm(piece.bitmap, 0, piece.window.origin_y, src_w, piece.window.height)
            .to_image();
    let scaled = if cropped.dimensions() == (width, piece.scaled_height) {
        cropped
    } else {
        imageops::resize(
            &cropped,
            width,
            piece.scaled_height,
            imageops::FilterType::Triangle,
        )
    };
    imageops::overlay(canvas, &scaled, 0, i64::from(y));
    Ok(())
}

/// Paint, stamp the watermark when the policy says so, and encode one segment to JPEG.
#[tracing::instrument(skip(pieces, style), fields(pieces = pieces.len()))]
pub fn render_segment(
    index: usize,
    pieces: &[RenderPiece<'_>],
    height: u32,
    style: &SegmentStyle<'_>,
    is_last: bool,
) -> LinestackResult<Vec<u8>> {
    if height > JPEG_MAX_DIMENSION {
        return Err(LinestackError::encode(
            index,
            format!("segment height {height} exceeds the JPEG limit of {JPEG_MAX_DIMENSION}"),
        ));
    }

    let mut canvas = paint_segment(pieces, height, style)?;
    if let Some(layer) = style.watermark
        && style.watermark_policy.applies_to(is_last)
    {
        layer.stamp(&mut canvas)?;
    }
    encode_segment_jpeg(index, &canvas, style.jpeg_quality)
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
