//! Verdicts and image embedding over whole result sheets.

use report_lib::model::{CellValue, Verdict};
use report_lib::{Diagnostics, ReportConfig, build_items};
use std::path::PathBuf;

mod common;
use common::{KnownFiles, find, heading_row, raw_rows};

fn build_with(
    rows: &[[&str; 7]],
    files: &[&str],
    config: &ReportConfig,
) -> (Vec<report_lib::model::ClassifiedItem>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let items = build_items(raw_rows(rows), config, &KnownFiles::new(files), &mut diagnostics);
    (items, diagnostics)
}

#[test]
fn test_result_image_is_embedded_from_images_folder() {
    let (items, diagnostics) = build_with(
        &[
            heading_row("1", "Signal"),
            ["1", "Eye diagram", "", "/", "清晰", "图片 eye.png", ""],
        ],
        &["eye.png"],
        &ReportConfig::default(),
    );

    let item = find(&items, "Eye diagram");
    let CellValue::Image(image) = &item.result else {
        panic!("result was not embedded: {:?}", item.result);
    };
    assert_eq!(image.path, PathBuf::from("images").join("eye.png"));
    assert_eq!(image.width_mm, Some(20));
    assert_eq!(image.name, "eye");
    assert_eq!(item.verdict, Some(Verdict::Pass));
    assert!(diagnostics.is_empty());
}

#[test]
fn test_require_image_is_resolved_from_templates() {
    let (items, _) = build_with(
        &[
            heading_row("1", "Signal"),
            ["1", "Mask", "", "/", "图片 curve.png", "符合", ""],
        ],
        &["curve.png"],
        &ReportConfig::default(),
    );

    let item = find(&items, "Mask");
    let CellValue::Image(image) = &item.require else {
        panic!("require was not embedded: {:?}", item.require);
    };
    assert_eq!(image.path, PathBuf::from("templates").join("curve.png"));
    assert_eq!(image.width_mm, Some(54));
    assert_eq!(item.result, CellValue::from("符合"));
}

#[test]
fn test_embedded_image_is_never_read_as_not_applicable() {
    let mut config = ReportConfig::default();
    config.not_applicable_markers.push("图片 eye.png".to_string());

    let (items, _) = build_with(
        &[
            heading_row("1", "Signal"),
            ["1", "Eye diagram", "", "/", "清晰", "图片 eye.png", ""],
        ],
        &["eye.png"],
        &config,
    );

    let item = find(&items, "Eye diagram");
    assert!(matches!(item.result, CellValue::Image(_)));
    assert_eq!(item.verdict, Some(Verdict::Pass));
}
