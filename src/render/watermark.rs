//! Watermark text: laid out and rasterized once per run through usvg/resvg, then stamped
//! bottom-right onto each segment with a soft drop shadow.

use std::{path::Path, sync::Arc};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{LinestackError, LinestackResult},
    render::{blur::blur_mask, composite::over_region},
};

/// Visual parameters of the watermark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkStyle {
    pub padding_right: u32,
    pub padding_bottom: u32,
    /// Font size as a fraction of the canvas width.
    pub font_size_ratio: f64,
    pub min_font_size: u32,
    /// Opacity of the white fill.
    pub opacity: f32,
    /// Alpha of the black shadow.
    pub shadow_alpha: f32,
    pub shadow_blur: u32,
    pub shadow_offset: (i32, i32),
    pub font_family: String,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            padding_right: 16,
            padding_bottom: 16,
            font_size_ratio: 0.02,
            min_font_size: 14,
            opacity: 0.6,
            shadow_alpha: 0.5,
            shadow_blur: 4,
            shadow_offset: (1, 1),
            font_family: "sans-serif".to_owned(),
        }
    }
}

impl WatermarkStyle {
    /// `max(min_font_size, round(width * font_size_ratio))`.
    pub fn font_size_for_width(&self, width: u32) -> u32 {
        let scaled = (f64::from(width) * self.font_size_ratio).round().max(0.0) as u32;
        scaled.max(self.min_font_size)
    }

    /// Height of the strip that holds the text, its descenders, padding and shadow spread.
    fn strip_height(&self, font_size: u32) -> u32 {
        font_size * 2 + self.padding_bottom + self.shadow_blur
    }
}

/// Rasterized watermark strip, as wide as the canvas and anchored to its bottom edge.
#[derive(Clone, Debug)]
pub struct WatermarkLayer {
    width: u32,
    height: u32,
    /// Premultiplied RGBA8 text fill.
    text: Vec<u8>,
    /// Blurred shadow as premultiplied black RGBA8.
    shadow: Vec<u8>,
    opacity: f32,
    shadow_opacity: f32,
    shadow_offset: (i32, i32),
}

impl WatermarkLayer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when no glyph produced any coverage (e.g. no usable font was found).
    pub fn is_blank(&self) -> bool {
        self.text.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Composite shadow then text onto the bottom of `canvas`.
    pub fn stamp(&self, canvas: &mut RgbaImage) -> LinestackResult<()> {
        if canvas.width() != self.width {
            return Err(LinestackError::render(format!(
                "watermark rasterized for width {}, canvas is {}",
                self.width,
                canvas.width()
            )));
        }
        let top = i64::from(canvas.height()) - i64::from(self.height);
        let (ox, oy) = self.shadow_offset;
        over_region(
            canvas,
            &self.shadow,
            self.width,
            self.height,
            i64::from(ox),
            top + i64::from(oy),
            self.shadow_opacity,
        )?;
        over_region(
            canvas,
            &self.text,
            self.width,
            self.height,
            0,
            top,
            self.opacity,
        )
    }
}

/// Turns watermark text into a [`WatermarkLayer`] using a font database built once.
pub struct WatermarkRasterizer {
    style: WatermarkStyle,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl WatermarkRasterizer {
    /// Load `.ttf`/`.otf`/`.ttc` files from `fonts_dir` when given, plus system fonts when
    /// `system_fonts` is set.
    pub fn new(style: WatermarkStyle, fonts_dir: Option<&Path>, system_fonts: bool) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if system_fonts {
            db.load_system_fonts();
        }
        if let Some(dir) = fonts_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "watermark font database ready");
        Self::with_fontdb(style, Arc::new(db))
    }

    pub fn with_fontdb(style: WatermarkStyle, fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { style, fontdb }
    }

    pub fn style(&self) -> &WatermarkStyle {
        &self.style
    }

    pub fn rasterize(&self, text: &str, canvas_width: u32) -> LinestackResult<WatermarkLayer> {
        let font_size = self.style.font_size_for_width(canvas_width);
        let height = self.style.strip_height(font_size);
        let svg = watermark_svg(text, canvas_width, height, font_size, &self.style);

        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| LinestackError::render(format!("parse watermark svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas_width, height)
            .ok_or_else(|| LinestackError::render("failed to allocate watermark pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        let text_px = pixmap.data().to_vec();

        let coverage: Vec<u8> = text_px.chunks_exact(4).map(|px| px[3]).collect();
        let sigma = (self.style.shadow_blur as f32 / 2.0).max(0.5);
        let blurred = blur_mask(&coverage, canvas_width, height, self.style.shadow_blur, sigma)?;
        let shadow = blurred.iter().flat_map(|&a| [0, 0, 0, a]).collect();

        Ok(WatermarkLayer {
            width: canvas_width,
            height,
            text: text_px,
            shadow,
            opacity: self.style.opacity,
            shadow_opacity: self.style.shadow_alpha * self.style.opacity,
            shadow_offset: self.style.shadow_offset,
        })
    }
}

/// Right-aligned text whose descender line sits `padding_bottom` above the strip's bottom edge.
fn watermark_svg(
    text: &str,
    width: u32,
    height: u32,
    font_size: u32,
    style: &WatermarkStyle,
) -> String {
    let x = width.saturating_sub(style.padding_right);
    let descent = (f64::from(font_size) * 0.22).round() as u32;
    let baseline = height.saturating_sub(style.padding_bottom + descent);
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" "#,
            r#"viewBox="0 0 {width} {height}"><text x="{x}" y="{baseline}" "#,
            r#"font-family="{family}" font-size="{font_size}" text-anchor="end" "#,
            r##"fill="#FFFFFF">{body}</text></svg>"##,
        ),
        width = width,
        height = height,
        x = x,
        baseline = baseline,
        font_size = font_size,
        family = escape_xml(&style.font_family),
        body = escape_xml(text),
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping font file");
        }
    }
}

/// Requested families first, then any sans-serif face, then whatever face exists.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/watermark.rs"]
mod tests;
