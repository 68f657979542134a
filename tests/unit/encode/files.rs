use super::*;

#[test]
fn single_output_has_no_suffix() {
    assert_eq!(output_file_names("linestack", 1), vec!["linestack.jpg"]);
}

#[test]
fn multiple_outputs_are_numbered_from_01() {
    assert_eq!(
        output_file_names("shots", 3),
        vec!["shots_01.jpg", "shots_02.jpg", "shots_03.jpg"]
    );
    let many = output_file_names("x", 12);
    assert_eq!(many[9], "x_10.jpg");
    assert_eq!(many[11], "x_12.jpg");
}

#[test]
fn no_outputs_no_names() {
    assert!(output_file_names("x", 0).is_empty());
}

#[test]
fn writes_files_in_segment_order() {
    let dir = std::path::PathBuf::from("target")
        .join("unit_files")
        .join("writes_files_in_segment_order");
    let _ = std::fs::remove_dir_all(&dir);

    let blobs = vec![vec![1u8, 2, 3], vec![4u8]];
    let paths = write_outputs(&dir, "part", &blobs).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("part_01.jpg"));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), vec![1, 2, 3]);
    assert_eq!(std::fs::read(&paths[1]).unwrap(), vec![4]);
}
