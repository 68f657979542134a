use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 255];
    assert_eq!(over(dst, [200, 200, 200, 200], 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over(dst, [255, 255, 255, 0], 1.0), dst);
}

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn over_keeps_opaque_dst_opaque() {
    let out = over([40, 40, 40, 255], [255, 255, 255, 255], 0.6);
    assert_eq!(out[3], 255);
    // 0.6 * 255 + 0.4 * 40
    assert!((i32::from(out[0]) - 169).abs() <= 1);
}

#[test]
fn region_is_clipped_to_destination() {
    let mut dst = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
    let src = [255u8, 255, 255, 255].repeat(9);
    over_region(&mut dst, &src, 3, 3, 2, -1, 1.0).unwrap();

    let white: Vec<(u32, u32)> = dst
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0 == [255, 255, 255, 255])
        .map(|(x, y, _)| (x, y))
        .collect();
    assert_eq!(white, vec![(2, 0), (3, 0), (2, 1), (3, 1)]);
}

#[test]
fn region_fully_outside_is_noop() {
    let mut dst = RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]));
    let before = dst.clone();
    let src = [255u8; 4];
    over_region(&mut dst, &src, 1, 1, 5, 5, 1.0).unwrap();
    assert_eq!(dst, before);
}

#[test]
fn region_rejects_bad_buffer_length() {
    let mut dst = RgbaImage::new(2, 2);
    assert!(over_region(&mut dst, &[0u8; 7], 1, 2, 0, 0, 1.0).is_err());
}
