use super::*;
use crate::{
    assets::source::{PixelSource, RasterSource},
    foundation::core::Rgb8,
    model::CropSpec,
};

fn solid(id: &str, w: u32, h: u32, rgb: [u8; 3], role: Role) -> ImageRecord {
    let raster = RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    ImageRecord::new(id, Arc::new(RasterSource::new(raster)), w, h, role)
}

fn settings() -> ExportSettings {
    ExportSettings::default()
}

#[test]
fn phase_percent_rounds_within_its_band() {
    assert_eq!(phase_percent(0, 3, 0, 50), 0);
    assert_eq!(phase_percent(1, 3, 0, 50), 17);
    assert_eq!(phase_percent(3, 3, 0, 50), 50);
    assert_eq!(phase_percent(1, 2, 60, 95), 78);
    assert_eq!(phase_percent(2, 2, 60, 95), 95);
    assert_eq!(phase_percent(0, 0, 60, 95), 95);
}

#[test]
fn stage_labels_match_the_progress_bar() {
    assert_eq!(Stage::Decoding.label(), "Processing images...");
    assert_eq!(Stage::Planning.label(), "Composing...");
    assert_eq!(Stage::Rendering.label(), "Exporting...");
    assert_eq!(Stage::Done.label(), "Done!");
}

#[test]
fn cancel_flag_is_shared_between_clones() {
    let flag = CancelFlag::new();
    let other = flag.clone();
    assert!(!flag.is_cancelled());
    other.cancel();
    assert!(flag.is_cancelled());
}

#[test]
fn empty_input_is_rejected_before_any_progress_past_zero() {
    let mut seen = Vec::new();
    let err = compose(&[], &GlobalCrop::default(), &settings(), |p| seen.push(p)).unwrap_err();
    assert!(matches!(err, LinestackError::EmptyInput));
    assert!(seen.iter().all(|p| p.percent == 0));
}

#[test]
fn subtitle_first_is_rejected() {
    let images = [solid("a", 100, 50, [0, 0, 0], Role::SubtitleOnly)];
    let err = compose(&images, &GlobalCrop::default(), &settings(), |_| {}).unwrap_err();
    assert!(matches!(
        err,
        LinestackError::InvalidFirstImage {
            role: Role::SubtitleOnly
        }
    ));
}

#[test]
fn metadata_disagreeing_with_decode_fails() {
    let raster = RgbaImage::from_pixel(100, 50, image::Rgba([0, 0, 0, 255]));
    let lying = ImageRecord::new(
        "lying",
        Arc::new(RasterSource::new(raster)),
        100,
        60,
        Role::Keyframe,
    );
    let err = compose(&[lying], &GlobalCrop::default(), &settings(), |_| {}).unwrap_err();
    match err {
        LinestackError::DimensionMismatch {
            image_id,
            expected,
            actual,
        } => {
            assert_eq!(image_id, "lying");
            assert_eq!(expected, (100, 60));
            assert_eq!(actual, (100, 50));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bad_custom_crop_fails_before_decoding() {
    struct Unreachable;
    impl PixelSource for Unreachable {
        fn decode(&self) -> anyhow::Result<RgbaImage> {
            panic!("decode must not be reached");
        }
        fn dimensions(&self) -> anyhow::Result<(u32, u32)> {
            Ok((100, 100))
        }
        fn describe(&self) -> String {
            "unreachable".to_owned()
        }
    }

    let images = [
        solid("k", 100, 100, [0, 0, 0], Role::Keyframe),
        ImageRecord::new("s", Arc::new(Unreachable), 100, 100, Role::SubtitleOnly)
            .with_custom_crop(CropSpec::bottom(0.0)),
    ];
    let err = compose(&images, &GlobalCrop::default(), &settings(), |_| {}).unwrap_err();
    assert!(matches!(err, LinestackError::InvalidCropSpec { ref image_id, .. } if image_id == "s"));
}

#[test]
fn progress_is_monotonic_and_ends_at_done() {
    let images = [
        solid("k", 1440, 810, [10, 10, 10], Role::Keyframe),
        solid("s1", 1440, 810, [20, 20, 20], Role::SubtitleOnly),
        solid("s2", 1440, 810, [30, 30, 30], Role::SubtitleOnly),
    ];
    let mut seen = Vec::new();
    let out = compose(&images, &GlobalCrop::default(), &settings(), |p| seen.push(p)).unwrap();
    assert_eq!(out.len(), 1);

    assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(seen.first().map(|p| p.percent), Some(0));
    assert_eq!(
        seen.last().copied(),
        Some(Progress {
            percent: 100,
            stage: Stage::Done
        })
    );
    assert!(seen.contains(&Progress {
        percent: 50,
        stage: Stage::Decoding
    }));
    assert!(seen.contains(&Progress {
        percent: 55,
        stage: Stage::Planning
    }));
    assert!(seen.contains(&Progress {
        percent: 95,
        stage: Stage::Rendering
    }));
}

#[test]
fn single_segment_matches_estimate() {
    let images = [
        solid("k", 1440, 810, [10, 10, 10], Role::Keyframe),
        solid("s1", 1440, 810, [20, 20, 20], Role::SubtitleOnly),
        solid("s2", 1440, 810, [30, 30, 30], Role::SubtitleOnly),
    ];
    let out = compose(&images, &GlobalCrop::default(), &settings(), |_| {}).unwrap();
    let seg = &out[0];
    assert_eq!(seg.index, 0);
    assert_eq!(seg.images, 0..3);
    assert_eq!((seg.width, seg.height), (720, 405 + 81 + 81));
    assert_eq!(&seg.jpeg[..2], &[0xFF, 0xD8]);
}

#[test]
fn cancelled_run_stops_with_cancelled() {
    let images = [solid("k", 100, 100, [0, 0, 0], Role::Keyframe)];
    let flag = CancelFlag::new();
    flag.cancel();
    let opts = ComposeOptions {
        cancel: Some(flag),
        ..ComposeOptions::default()
    };
    let err =
        compose_with(&images, &GlobalCrop::default(), &settings(), &opts, |_| {}).unwrap_err();
    assert!(matches!(err, LinestackError::Cancelled));
}

#[test]
fn cancel_from_progress_callback_stops_between_segments() {
    // 1080 wide, 1920 tall keyframes scale to 1920 rows each; limit 12000 forces several files.
    let images: Vec<_> = (0..10)
        .map(|i| solid(&format!("k{i}"), 1080, 1920, [0, 0, 0], Role::Keyframe))
        .collect();
    let settings = ExportSettings {
        output_width: OutputWidth::W1080,
        ..ExportSettings::default()
    };
    let flag = CancelFlag::new();
    let opts = ComposeOptions {
        cancel: Some(flag.clone()),
        ..ComposeOptions::default()
    };
    let err = compose_with(&images, &GlobalCrop::default(), &settings, &opts, |p| {
        if p.stage == Stage::Rendering && p.percent > 60 {
            flag.cancel();
        }
    })
    .unwrap_err();
    assert!(matches!(err, LinestackError::Cancelled));
}

#[test]
fn plan_layout_splits_under_the_width_ceiling() {
    use crate::foundation::core::Role::{Keyframe as K, SubtitleOnly as S};
    let roles = [K, S, K, S, K];
    let heights = [5_000u32; 5];
    let plan = plan_layout(
        &roles,
        &heights,
        true,
        OutputWidth::W1080,
        &ExportLimits::default(),
    );
    assert_eq!(plan.gaps, vec![false, false, true, false, true]);
    assert_eq!(plan.total_height, 25_000 + 2 * 8);
    assert_eq!(plan.risk, RiskLevel::High);
    assert_eq!(plan.segments.len(), 3);
    assert!(plan.segments.iter().all(|s| s.height <= 12_000));
    assert_eq!(plan.segments[0].range, 0..2);
    assert_eq!(plan.segments[0].height, 10_000);
    // The band above position 2 falls on a file boundary and is dropped.
    assert_eq!(plan.segments[1].gaps, vec![false, false]);
}

#[test]
fn gap_color_fills_the_band() {
    let images = [
        solid("k", 100, 100, [0, 0, 0], Role::Keyframe),
        solid("s", 100, 100, [0, 0, 0], Role::SubtitleOnly),
        solid("k2", 100, 100, [0, 0, 0], Role::Keyframe),
    ];
    let settings = ExportSettings {
        enable_gap: true,
        gap_color: Rgb8::WHITE,
        ..ExportSettings::default()
    };
    let out = compose(&images, &GlobalCrop::default(), &settings, |_| {}).unwrap();
    assert_eq!(out[0].height, 720 + 144 + 8 + 720);

    let decoded = image::load_from_memory(&out[0].jpeg).unwrap().to_rgb8();
    let band = decoded.get_pixel(360, 868).0;
    assert!(band.iter().all(|&c| c > 200), "band pixel {band:?}");
    let body = decoded.get_pixel(360, 300).0;
    assert!(body.iter().all(|&c| c < 40), "body pixel {body:?}");
}

#[test]
fn thin_crop_after_oversized_keyframe_still_encodes() {
    // 4000 wide with a 1 row crop would round to 0 rows at 720.
    let images = [
        solid("tall", 360, 10_000, [0, 0, 0], Role::Keyframe),
        solid("thin", 4000, 5, [255, 255, 255], Role::SubtitleOnly),
    ];
    let global = GlobalCrop::default();
    let estimate = crate::layout::geometry::estimate_total_height(
        &images,
        &global,
        OutputWidth::W720,
        false,
    )
    .unwrap();
    assert_eq!(estimate, 20_001);

    let out = compose(&images, &global, &settings(), |_| {}).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].images, 1..2);
    assert_eq!((out[0].height, out[1].height), (20_000, 1));
    assert!(out.iter().all(|s| !s.jpeg.is_empty()));
}

#[test]
fn watermark_without_any_font_fails() {
    let images = [solid("k", 100, 100, [0, 0, 0], Role::Keyframe)];
    let settings = ExportSettings {
        watermark_text: "@me".to_owned(),
        ..ExportSettings::default()
    };
    let opts = ComposeOptions {
        system_fonts: false,
        ..ComposeOptions::default()
    };
    let err = compose_with(&images, &GlobalCrop::default(), &settings, &opts, |_| {}).unwrap_err();
    assert!(matches!(err, LinestackError::Render(ref m) if m.contains("no usable font")));
}

#[test]
fn watermark_from_fonts_dir_only() {
    let images = [solid("k", 100, 100, [0, 0, 0], Role::Keyframe)];
    let settings = ExportSettings {
        watermark_text: "@me".to_owned(),
        ..ExportSettings::default()
    };
    let opts = ComposeOptions {
        fonts_dir: Some(PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fonts"))),
        system_fonts: false,
        ..ComposeOptions::default()
    };
    let out = compose_with(&images, &GlobalCrop::default(), &settings, &opts, |_| {}).unwrap();
    assert_eq!(out.len(), 1);
}
