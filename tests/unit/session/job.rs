use std::io::Cursor;

use super::*;
use crate::{foundation::core::OutputWidth, model::CropMode};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_job").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, w: u32, h: u32) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([50, 60, 70, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

#[test]
fn minimal_job_takes_defaults() {
    let job = ExportJob::from_json_str(
        r#"{ "images": [ { "path": "a.png", "role": "keyframe" } ] }"#,
    )
    .unwrap();
    assert_eq!(job.settings, ExportSettings::default());
    assert_eq!(job.global_crop, GlobalCrop::default());
    assert_eq!(job.limits, ExportLimits::default());
    assert_eq!(job.fonts_dir, None);
}

#[test]
fn settings_and_crops_parse() {
    let job = ExportJob::from_json_str(
        r##"{
            "images": [
                { "path": "a.png", "role": "keyframe" },
                { "id": "two", "path": "b.png", "role": "subtitle",
                  "crop": { "method": "drag", "top_ratio": 0.5, "height_ratio": 0.25 } }
            ],
            "global_crop": { "enabled": false },
            "settings": { "output_width": 1080, "enable_gap": true, "gap_color": "#333333" }
        }"##,
    )
    .unwrap();
    assert_eq!(job.settings.output_width, OutputWidth::W1080);
    assert!(job.settings.enable_gap);
    assert_eq!(job.settings.gap_color, crate::Rgb8::DARK_GRAY);
    assert!(!job.global_crop.enabled);
    assert_eq!(job.images[1].role, Role::SubtitleOnly);
    assert_eq!(job.images[1].crop, Some(CropSpec::window(0.5, 0.25)));
}

#[test]
fn unsupported_width_is_rejected() {
    let err = ExportJob::from_json_str(
        r#"{ "images": [], "settings": { "output_width": 800 } }"#,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("parse export job JSON"));
}

#[test]
fn long_watermark_is_truncated_on_load() {
    let job = ExportJob::from_json_str(
        r#"{ "images": [], "settings": { "watermark_text": "abcdefghijklmnopqrstuvwxyz" } }"#,
    )
    .unwrap();
    assert_eq!(job.settings.watermark_text, "abcdefghijklmnopqrst");
    job.settings.validate().unwrap();
}

#[test]
fn records_resolve_relative_paths_and_probe_headers() {
    let dir = scratch_dir("records_resolve_relative_paths");
    write_png(&dir.join("first.png"), 40, 30);
    write_png(&dir.join("second.png"), 40, 30);

    let job = ExportJob::from_json_str(
        r#"{ "images": [
            { "path": "first.png", "role": "keyframe" },
            { "path": "second.png", "role": "subtitle_only",
              "crop": { "method": "bottom_ratio", "bottom_percent": 50 } }
        ] }"#,
    )
    .unwrap();
    let records = job.records(&dir).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "first");
    assert_eq!((records[0].native_width, records[0].native_height), (40, 30));
    assert_eq!(records[0].crop_mode, CropMode::InheritGlobal);
    assert_eq!(records[1].crop_mode, CropMode::Custom(CropSpec::bottom(50.0)));
}

#[test]
fn duplicate_ids_are_rejected() {
    let dir = scratch_dir("duplicate_ids_are_rejected");
    write_png(&dir.join("x.png"), 4, 4);
    let job = ExportJob::from_json_str(
        r#"{ "images": [
            { "path": "x.png", "role": "keyframe" },
            { "path": "x.png", "role": "keyframe" }
        ] }"#,
    )
    .unwrap();
    let err = job.records(&dir).unwrap_err();
    assert!(matches!(err, LinestackError::Validation(ref m) if m.contains("duplicate")));
}

#[test]
fn too_many_images_are_rejected() {
    let images: Vec<_> = (0..=MAX_IMAGES)
        .map(|i| JobImage {
            id: None,
            path: PathBuf::from(format!("{i}.png")),
            role: Role::Keyframe,
            crop: None,
        })
        .collect();
    let job = ExportJob {
        images,
        global_crop: GlobalCrop::default(),
        settings: ExportSettings::default(),
        limits: ExportLimits::default(),
        watermark_style: WatermarkStyle::default(),
        fonts_dir: None,
        system_fonts: true,
    };
    let err = job.records(Path::new(".")).unwrap_err();
    assert!(matches!(err, LinestackError::Validation(_)));
}

#[test]
fn missing_image_is_a_decode_error() {
    let dir = scratch_dir("missing_image_is_a_decode_error");
    let job = ExportJob::from_json_str(
        r#"{ "images": [ { "id": "gone", "path": "gone.png", "role": "keyframe" } ] }"#,
    )
    .unwrap();
    let err = job.records(&dir).unwrap_err();
    assert!(matches!(err, LinestackError::Decode { ref image_id, .. } if image_id == "gone"));
}

#[test]
fn fonts_dir_resolves_against_base() {
    let job = ExportJob::from_json_str(r#"{ "images": [], "fonts_dir": "fonts" }"#).unwrap();
    let opts = job.compose_options(Path::new("/jobs"));
    assert_eq!(opts.fonts_dir, Some(PathBuf::from("/jobs/fonts")));
    assert!(opts.system_fonts);
    assert!(opts.cancel.is_none());
}

#[test]
fn system_fonts_can_be_switched_off() {
    let job = ExportJob::from_json_str(r#"{ "images": [], "system_fonts": false }"#).unwrap();
    assert!(!job.compose_options(Path::new(".")).system_fonts);
}
