use crate::{
    foundation::core::Role,
    foundation::error::{LinestackError, LinestackResult},
    model::{CropMode, CropSpec, GlobalCrop, ImageRecord},
};

/// Rows of the source image that survive cropping, in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    pub origin_y: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn full(native_height: u32) -> Self {
        Self {
            origin_y: 0,
            height: native_height,
        }
    }

    pub fn end_y(self) -> u32 {
        self.origin_y + self.height
    }
}

/// Custom override, then the global crop when enabled, then the built-in default.
pub fn effective_crop_spec(record: &ImageRecord, global: &GlobalCrop) -> CropSpec {
    match record.crop_mode {
        CropMode::Custom(spec) => spec,
        CropMode::InheritGlobal if global.enabled => global.spec,
        CropMode::InheritGlobal => CropSpec::DEFAULT,
    }
}

pub fn validate_crop_spec(spec: &CropSpec) -> Result<(), String> {
    match *spec {
        CropSpec::BottomRatio { bottom_percent } => {
            if !bottom_percent.is_finite() || bottom_percent <= 0.0 || bottom_percent > 100.0 {
                return Err(format!(
                    "bottom_percent must be in (0, 100], got {bottom_percent}"
                ));
            }
        }
        CropSpec::Window {
            top_ratio,
            height_ratio,
        } => {
            if !top_ratio.is_finite() || !(0.0..=1.0).contains(&top_ratio) {
                return Err(format!("top_ratio must be in [0, 1], got {top_ratio}"));
            }
            if !height_ratio.is_finite() || height_ratio <= 0.0 || height_ratio > 1.0 {
                return Err(format!(
                    "height_ratio must be in (0, 1], got {height_ratio}"
                ));
            }
            if top_ratio + height_ratio > 1.0 + 1e-9 {
                return Err(format!(
                    "top_ratio + height_ratio must be <= 1, got {}",
                    top_ratio + height_ratio
                ));
            }
        }
    }
    Ok(())
}

/// Compute the kept window for an image of `native_height` rows.
///
/// Keyframes are never cropped. Rounding that would leave an empty window is clamped to one row;
/// a spec that is itself empty or out of range is rejected.
pub fn crop_window(role: Role, spec: &CropSpec, native_height: u32) -> Result<CropWindow, String> {
    if native_height == 0 {
        return Err("image has zero height".to_owned());
    }
    if role.is_keyframe() {
        return Ok(CropWindow::full(native_height));
    }
    validate_crop_spec(spec)?;

    let h = f64::from(native_height);
    let window = match *spec {
        CropSpec::BottomRatio { bottom_percent } => {
            let height = round_px(h * bottom_percent / 100.0).clamp(1, native_height);
            CropWindow {
                origin_y: native_height - height,
                height,
            }
        }
        CropSpec::Window {
            top_ratio,
            height_ratio,
        } => {
            let origin_y = round_px(h * top_ratio).min(native_height - 1);
            let height = round_px(h * height_ratio)
                .max(1)
                .min(native_height - origin_y);
            CropWindow { origin_y, height }
        }
    };
    debug_assert!(window.end_y() <= native_height);
    Ok(window)
}

/// Resolve the crop for one record against the global setting.
pub fn resolve_crop(record: &ImageRecord, global: &GlobalCrop) -> LinestackResult<CropWindow> {
    let spec = effective_crop_spec(record, global);
    crop_window(record.role, &spec, record.native_height)
        .map_err(|reason| LinestackError::invalid_crop(&record.id, reason))
}

fn round_px(v: f64) -> u32 {
    v.round().max(0.0) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/layout/crop.rs"]
mod tests;
