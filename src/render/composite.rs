use image::RgbaImage;

use crate::foundation::error::{LinestackError, LinestackResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over of one premultiplied pixel with an extra layer opacity.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite a premultiplied `src_w x src_h` layer onto `dst` with its top-left at `(dx, dy)`.
///
/// `dst` must be fully opaque (as a filled canvas is), so its straight and premultiplied forms
/// coincide. Parts of the layer outside `dst` are clipped.
pub fn over_region(
    dst: &mut RgbaImage,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    dx: i64,
    dy: i64,
    opacity: f32,
) -> LinestackResult<()> {
    if src.len() != src_w as usize * src_h as usize * 4 {
        return Err(LinestackError::render(
            "over_region expects src matching width*height*4",
        ));
    }

    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let x0 = dx.max(0);
    let y0 = dy.max(0);
    let x1 = (dx + i64::from(src_w)).min(dw);
    let y1 = (dy + i64::from(src_h)).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for y in y0..y1 {
        let sy = (y - dy) as usize;
        for x in x0..x1 {
            let sx = (x - dx) as usize;
            let idx = (sy * src_w as usize + sx) * 4;
            let s = [src[idx], src[idx + 1], src[idx + 2], src[idx + 3]];
            let px = dst.get_pixel_mut(x as u32, y as u32);
            px.0 = over(px.0, s, opacity);
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
