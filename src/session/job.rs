//! JSON export jobs: the CLI's stand-in for an interactive image list.
//!
//! ```json
//! {
//!   "images": [
//!     { "path": "shot01.png", "role": "keyframe" },
//!     {
//!       "path": "shot02.png",
//!       "role": "subtitle_only",
//!       "crop": { "method": "bottom_ratio", "bottom_percent": 15 }
//!     }
//!   ],
//!   "settings": { "output_width": 1080, "enable_gap": true, "watermark_text": "@me" }
//! }
//! ```
//!
//! Relative image paths resolve against the job file's directory.

use std::{
    collections::HashSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::{MAX_IMAGES, Role},
    foundation::error::{LinestackError, LinestackResult},
    layout::risk::ExportLimits,
    model::{CropSpec, ExportSettings, GlobalCrop, ImageRecord, truncate_watermark},
    render::watermark::WatermarkStyle,
    session::compose::ComposeOptions,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobImage {
    /// Defaults to the file stem.
    #[serde(default)]
    pub id: Option<String>,
    pub path: PathBuf,
    pub role: Role,
    /// Per-image override of the global crop.
    #[serde(default)]
    pub crop: Option<CropSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    pub images: Vec<JobImage>,
    #[serde(default)]
    pub global_crop: GlobalCrop,
    #[serde(default)]
    pub settings: ExportSettings,
    #[serde(default)]
    pub limits: ExportLimits,
    #[serde(default)]
    pub watermark_style: WatermarkStyle,
    #[serde(default)]
    pub fonts_dir: Option<PathBuf>,
    /// Load installed system fonts for the watermark in addition to `fonts_dir`.
    #[serde(default = "default_system_fonts")]
    pub system_fonts: bool,
}

fn default_system_fonts() -> bool {
    true
}

impl ExportJob {
    pub fn from_json_str(s: &str) -> LinestackResult<Self> {
        let job: ExportJob = serde_json::from_str(s).context("parse export job JSON")?;
        Ok(job.normalized())
    }

    pub fn from_path(path: &Path) -> LinestackResult<Self> {
        let f = File::open(path).with_context(|| format!("open job '{}'", path.display()))?;
        let job: ExportJob = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse job '{}'", path.display()))?;
        Ok(job.normalized())
    }

    /// Clip the watermark to its maximum length, as the settings form would.
    fn normalized(mut self) -> Self {
        self.settings.watermark_text = truncate_watermark(&self.settings.watermark_text);
        self
    }

    /// Probe every image header and build records in job order.
    pub fn records(&self, base_dir: &Path) -> LinestackResult<Vec<ImageRecord>> {
        if self.images.len() > MAX_IMAGES {
            return Err(LinestackError::validation(format!(
                "job lists {} images, max is {MAX_IMAGES}",
                self.images.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.images.len());
        for (i, img) in self.images.iter().enumerate() {
            let id = img.id.clone().unwrap_or_else(|| default_id(&img.path, i));
            if !seen.insert(id.clone()) {
                return Err(LinestackError::validation(format!(
                    "duplicate image id '{id}'"
                )));
            }
            let path = if img.path.is_absolute() {
                img.path.clone()
            } else {
                base_dir.join(&img.path)
            };
            let mut record = ImageRecord::from_path(id, &path, img.role)?;
            if let Some(spec) = img.crop {
                record = record.with_custom_crop(spec);
            }
            out.push(record);
        }
        Ok(out)
    }

    /// Options for this job; a relative `fonts_dir` resolves against `base_dir`.
    pub fn compose_options(&self, base_dir: &Path) -> ComposeOptions {
        ComposeOptions {
            limits: self.limits,
            watermark_style: self.watermark_style.clone(),
            fonts_dir: self.fonts_dir.as_ref().map(|d| {
                if d.is_absolute() {
                    d.clone()
                } else {
                    base_dir.join(d)
                }
            }),
            system_fonts: self.system_fonts,
            cancel: None,
        }
    }
}

fn default_id(path: &Path, index: usize) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("image{index:02}"))
}

#[cfg(test)]
#[path = "../../tests/unit/session/job.rs"]
mod tests;
