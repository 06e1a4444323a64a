//! Row type inference for the results sheet.
//!
//! The sheet stores no explicit row type. Headings, notes and the three test
//! item layouts are told apart by which of `name`, `subname`, `unit` and
//! `require` are filled in, with one row of lookahead for single-row items.

use tracing::debug;

use crate::config::ReportConfig;
use crate::diagnostics::{DataQualityIssue, Diagnostics};
use crate::model::{ClassifiedItem, ItemKind, Part, RawRow};

/// Classify every row, keeping order and length.
///
/// Malformed rows are reported and kept with [`ItemKind::Malformed`].
pub fn classify(
    rows: Vec<RawRow>,
    config: &ReportConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<ClassifiedItem> {
    let kinds = infer_kinds(&rows, config);

    let mut items: Vec<ClassifiedItem> = Vec::with_capacity(rows.len());
    let mut group_name = String::new();
    for (row, kind) in rows.into_iter().zip(kinds) {
        let mut item = ClassifiedItem::new(row, kind);
        match kind {
            ItemKind::Note => {
                item.num = item.num.replace(config.note_marker, "");
            }
            ItemKind::GroupHeadItem | ItemKind::SubgroupHeadItem => {
                group_name = item.name.clone();
            }
            ItemKind::GroupMemberItem | ItemKind::SubgroupMemberItem => {
                item.name = group_name.clone();
            }
            ItemKind::Malformed => {
                diagnostics.push(DataQualityIssue::MalformedRow {
                    row: item.source_row,
                });
            }
            _ => {}
        }
        items.push(item);
    }

    refine_headings(&mut items, config);
    debug!("classified {} rows", items.len());
    items
}

/// Decide the kind of each row from its shape.
///
/// Headings come out as [`ItemKind::MinorHeading`] and are refined afterwards.
fn infer_kinds(rows: &[RawRow], config: &ReportConfig) -> Vec<ItemKind> {
    let mut kinds = vec![ItemKind::Malformed; rows.len()];
    let mut i = 0;
    while i < rows.len() {
        let row = &rows[i];
        if row.subname.is_empty() && row.unit.is_empty() && row.require.is_empty() {
            kinds[i] = if row.num.contains(config.note_marker) {
                ItemKind::Note
            } else {
                ItemKind::MinorHeading
            };
            i += 1;
        } else if !row.name.is_empty() && row.subname.is_empty() {
            let next_starts_item = rows.get(i + 1).is_none_or(|next| !next.name.is_empty());
            if next_starts_item {
                kinds[i] = ItemKind::SimpleItem;
                i += 1;
            } else {
                kinds[i] = ItemKind::GroupHeadItem;
                let mut j = i + 1;
                while j < rows.len() && rows[j].name.is_empty() && rows[j].subname.is_empty() {
                    kinds[j] = ItemKind::GroupMemberItem;
                    j += 1;
                }
                i = j;
            }
        } else if !row.name.is_empty() {
            kinds[i] = ItemKind::SubgroupHeadItem;
            let mut j = i + 1;
            while j < rows.len() && rows[j].name.is_empty() && !rows[j].subname.is_empty() {
                kinds[j] = ItemKind::SubgroupMemberItem;
                j += 1;
            }
            i = j;
        } else {
            i += 1;
        }
    }
    kinds
}

/// Assign section roots, heading depth and the part of every row.
fn refine_headings(items: &mut [ClassifiedItem], config: &ReportConfig) {
    let mut part = Part::One;
    for item in items.iter_mut() {
        if item.is_heading() {
            if item.num.contains(&config.part_one_marker) {
                item.kind = ItemKind::SectionRoot;
            } else if item.num.contains(&config.part_two_marker) {
                item.kind = ItemKind::SectionRoot;
                part = Part::Two;
            } else if item.level < 2 {
                item.kind = ItemKind::MajorHeading;
            }
            item.counters = Some(Default::default());
        }
        item.part = part;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: [&str; 7], source_row: usize) -> RawRow {
        let cells: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        RawRow::from_cells(&cells, source_row)
    }

    fn kinds_of(rows: Vec<RawRow>) -> Vec<ItemKind> {
        let mut diagnostics = Diagnostics::new();
        classify(rows, &ReportConfig::default(), &mut diagnostics)
            .iter()
            .map(|item| item.kind)
            .collect()
    }

    #[test]
    fn test_last_row_with_name_is_simple_item() {
        let kinds = kinds_of(vec![row(["1", "Name", "", "V", "≥1", "2", ""], 2)]);
        assert_eq!(kinds, vec![ItemKind::SimpleItem]);
    }

    #[test]
    fn test_member_rows_stop_at_next_name() {
        let kinds = kinds_of(vec![
            row(["1", "Voltage", "", "V", "≥1", "2", ""], 2),
            row(["2", "", "", "V", "≥1", "2", ""], 3),
            row(["3", "", "", "V", "≥1", "2", ""], 4),
            row(["4", "Current", "", "A", "≤1", "0.5", ""], 5),
        ]);
        assert_eq!(
            kinds,
            vec![
                ItemKind::GroupHeadItem,
                ItemKind::GroupMemberItem,
                ItemKind::GroupMemberItem,
                ItemKind::SimpleItem,
            ]
        );
    }

    #[test]
    fn test_row_with_subname_only_is_malformed() {
        let mut diagnostics = Diagnostics::new();
        let items = classify(
            vec![row(["1", "", "sub", "V", "≥1", "2", ""], 9)],
            &ReportConfig::default(),
            &mut diagnostics,
        );
        assert_eq!(items[0].kind, ItemKind::Malformed);
        assert_eq!(
            diagnostics.issues(),
            &[DataQualityIssue::MalformedRow { row: 9 }]
        );
    }

    #[test]
    fn test_headings_get_empty_counters() {
        let mut diagnostics = Diagnostics::new();
        let items = classify(
            vec![
                row(["1", "Heading", "", "", "", "", ""], 2),
                row(["1.1", "Item", "", "V", "1", "1", ""], 3),
            ],
            &ReportConfig::default(),
            &mut diagnostics,
        );
        assert_eq!(items[0].counters, Some(Default::default()));
        assert_eq!(items[1].counters, None);
    }
}
