use crate::foundation::error::{LinestackError, LinestackResult};

/// Separable gaussian blur of a single-channel coverage mask (the watermark's shadow).
///
/// Edges clamp. Weights are Q16 fixed point so results are bit-identical across platforms.
pub fn blur_mask(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> LinestackResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| LinestackError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(LinestackError::render("blur_mask expects src matching width*height"));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    let (w, h) = (width as i32, height as i32);
    convolve(src, &mut tmp, w, h, &kernel, |x, y, d| ((x + d).clamp(0, w - 1), y));
    convolve(&tmp, &mut out, w, h, &kernel, |x, y, d| (x, (y + d).clamp(0, h - 1)));
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> LinestackResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LinestackError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Push rounding drift into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + 65536 - acc).clamp(0, 65536) as u32;

    Ok(weights)
}

fn convolve(
    src: &[u8],
    dst: &mut [u8],
    w: i32,
    h: i32,
    kernel: &[u32],
    sample: impl Fn(i32, i32, i32) -> (i32, i32),
) {
    let radius = (kernel.len() / 2) as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in kernel.iter().enumerate() {
                let (sx, sy) = sample(x, y, ki as i32 - radius);
                acc += u64::from(kw) * u64::from(src[(sy * w + sx) as usize]);
            }
            dst[(y * w + x) as usize] = ((acc + 32768) >> 16).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
