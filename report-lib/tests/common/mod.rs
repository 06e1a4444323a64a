use report_lib::model::ClassifiedItem;
use report_lib::{Diagnostics, ReportConfig, build_items};

// Re-export shared test utilities from src/test_utils.rs
// These are the core functions used by most tests
#[allow(unused_imports)]
pub use report_lib::test_utils::{KnownFiles, MemorySheets, raw_row, raw_rows, sample_workbook};

// =============================================================================
// Pipeline helpers
// =============================================================================

/// Run classification, verdicts and aggregation with the default configuration.
#[allow(dead_code)]
pub fn build(rows: &[[&str; 7]]) -> (Vec<ClassifiedItem>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let items = build_items(
        raw_rows(rows),
        &ReportConfig::default(),
        &KnownFiles::default(),
        &mut diagnostics,
    );
    (items, diagnostics)
}

/// The `num` column of every retained test item, in order.
#[allow(dead_code)]
pub fn item_numbers(items: &[ClassifiedItem]) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.is_test_item())
        .map(|item| item.num.clone())
        .collect()
}

/// Find a retained item by its name.
#[allow(dead_code)]
pub fn find<'a>(items: &'a [ClassifiedItem], name: &str) -> &'a ClassifiedItem {
    items
        .iter()
        .find(|item| item.name == name)
        .unwrap_or_else(|| panic!("no item named '{name}'"))
}

// =============================================================================
// Row shorthands
// =============================================================================

#[allow(dead_code)]
pub fn heading_row<'a>(num: &'a str, name: &'a str) -> [&'a str; 7] {
    [num, name, "", "", "", "", ""]
}

#[allow(dead_code)]
pub fn item_row<'a>(num: &'a str, name: &'a str, result: &'a str) -> [&'a str; 7] {
    [num, name, "", "V", "≥1", result, ""]
}
