use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::OutputWidth,
    foundation::error::{LinestackError, LinestackResult},
    layout::geometry::estimate_total_height,
    model::{ExportSettings, GlobalCrop, ImageRecord},
};

/// Informational tier shown before an export is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

/// Height limits for one output width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthLimits {
    /// Heights up to this are `low`.
    pub low_max: u64,
    /// Heights up to this are `medium`; above is `high`.
    pub medium_max: u64,
    /// Hard ceiling for a packed segment, independent of the tier.
    pub max_segment_height: u32,
}

/// Risk thresholds and packing ceilings per output width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportLimits {
    #[serde(rename = "720")]
    pub w720: WidthLimits,
    #[serde(rename = "1080")]
    pub w1080: WidthLimits,
}

impl Default for ExportLimits {
    fn default() -> Self {
        Self {
            w720: WidthLimits {
                low_max: 20_000,
                medium_max: 35_000,
                max_segment_height: 18_000,
            },
            w1080: WidthLimits {
                low_max: 14_000,
                medium_max: 25_000,
                max_segment_height: 12_000,
            },
        }
    }
}

impl ExportLimits {
    pub fn for_width(&self, width: OutputWidth) -> &WidthLimits {
        match width {
            OutputWidth::W720 => &self.w720,
            OutputWidth::W1080 => &self.w1080,
        }
    }

    pub fn validate(&self) -> LinestackResult<()> {
        for width in OutputWidth::ALL {
            let l = self.for_width(width);
            if l.low_max > l.medium_max {
                return Err(LinestackError::validation(format!(
                    "limits for {width}: low_max {} exceeds medium_max {}",
                    l.low_max, l.medium_max
                )));
            }
            if l.max_segment_height == 0 {
                return Err(LinestackError::validation(format!(
                    "limits for {width}: max_segment_height must be > 0"
                )));
            }
        }
        Ok(())
    }

    pub fn assess_risk(&self, total_height: u64, width: OutputWidth) -> RiskLevel {
        let l = self.for_width(width);
        if total_height <= l.low_max {
            RiskLevel::Low
        } else if total_height <= l.medium_max {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn max_segment_height(&self, width: OutputWidth) -> u32 {
        self.for_width(width).max_segment_height
    }

    /// Lower bound on the number of output files: `ceil(total / max_segment_height)`.
    pub fn estimate_segment_count(&self, total_height: u64, width: OutputWidth) -> u64 {
        let max = u64::from(self.max_segment_height(width));
        total_height.div_ceil(max).max(1)
    }
}

/// Tier for `total_height` using the default limits.
pub fn assess_risk(total_height: u64, width: OutputWidth) -> RiskLevel {
    ExportLimits::default().assess_risk(total_height, width)
}

/// Packing ceiling for `width` using the default limits.
pub fn max_segment_height(width: OutputWidth) -> u32 {
    ExportLimits::default().max_segment_height(width)
}

/// What the export panel shows before the user commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RiskReport {
    pub estimated_height: u64,
    pub risk: RiskLevel,
    pub estimated_segments: u64,
}

pub fn assess_export(
    images: &[ImageRecord],
    global: &GlobalCrop,
    settings: &ExportSettings,
    limits: &ExportLimits,
) -> LinestackResult<RiskReport> {
    limits.validate()?;
    let estimated_height =
        estimate_total_height(images, global, settings.output_width, settings.enable_gap)?;
    Ok(RiskReport {
        estimated_height,
        risk: limits.assess_risk(estimated_height, settings.output_width),
        estimated_segments: limits.estimate_segment_count(estimated_height, settings.output_width),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layout/risk.rs"]
mod tests;
