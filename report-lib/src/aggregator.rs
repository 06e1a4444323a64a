//! Heading statistics, pruning and renumbering of the classified rows.
//!
//! Headings are scope markers in a flat sequence, not tree nodes. A heading
//! directly followed by non-heading rows owns that contiguous run; the run
//! decides whether the heading is a tested leaf, an untested leaf, or a
//! heading over notes only.

use tracing::debug;

use crate::model::{ClassifiedItem, Counters, ItemKind, Stub, Verdict};

/// Tally the verdicts of the test items selected by `scope`.
///
/// Rows without a verdict (headings, notes, malformed rows) never count.
pub fn tally<'a, I, F>(items: I, scope: F) -> Counters
where
    I: IntoIterator<Item = &'a ClassifiedItem>,
    F: Fn(&ClassifiedItem) -> bool,
{
    items
        .into_iter()
        .filter(|item| item.is_test_item() && scope(*item))
        .filter_map(|item| item.verdict)
        .collect()
}

/// Build the retained item sequence with heading statistics.
///
/// - Headings over at least one tested item keep their rows; every test item
///   below them gets the next global sequence number (`*` prefixed for
///   reference items).
/// - Headings over only not-applicable items keep their counters but drop
///   their rows.
/// - Headings over notes only are kept together with the notes.
///
/// Major headings are then given the tally of every retained test item up
/// to the next major heading or section root. An untested major leaf keeps
/// the counters of its dropped rows.
pub fn aggregate(items: Vec<ClassifiedItem>) -> Vec<ClassifiedItem> {
    let mut retained = prune_and_renumber(items);
    roll_up_major_headings(&mut retained);
    retained
}

fn prune_and_renumber(items: Vec<ClassifiedItem>) -> Vec<ClassifiedItem> {
    let mut retained: Vec<ClassifiedItem> = Vec::with_capacity(items.len());
    let mut sequence: u32 = 1;
    let mut rows = items.into_iter().peekable();

    while let Some(mut current) = rows.next() {
        let opens_subtree =
            current.is_heading() && rows.peek().is_some_and(|next| !next.is_heading());
        if !opens_subtree {
            if current.is_heading() {
                current.stub = Some(Stub::NonLeaf);
            }
            retained.push(current);
            continue;
        }

        let mut subtree: Vec<ClassifiedItem> = Vec::new();
        while let Some(row) = rows.next_if(|row| !row.is_heading()) {
            subtree.push(row);
        }
        let counters = tally(&subtree, |_| true);

        if counters.tested() > 0 {
            current.counters = Some(counters);
            current.stub = Some(Stub::LeafTested);
            retained.push(current);
            for mut item in subtree {
                if item.is_test_item() {
                    item.num = match item.verdict {
                        Some(Verdict::Reference) => format!("*{sequence}"),
                        _ => sequence.to_string(),
                    };
                    sequence += 1;
                }
                retained.push(item);
            }
        } else if counters.total() > 0 {
            debug!(
                "heading '{}' (row {}) has only not applicable items, dropping {} rows",
                current.num,
                current.source_row,
                subtree.len()
            );
            current.counters = Some(counters);
            current.stub = Some(Stub::LeafUntested);
            retained.push(current);
        } else {
            current.counters = None;
            current.stub = Some(Stub::NonLeaf);
            retained.push(current);
            retained.extend(subtree);
        }
    }

    retained
}

fn roll_up_major_headings(items: &mut [ClassifiedItem]) {
    let mut i = 0;
    while i < items.len() {
        // An untested leaf keeps the tally of its dropped rows
        if items[i].kind != ItemKind::MajorHeading || items[i].stub == Some(Stub::LeafUntested) {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < items.len()
            && !matches!(
                items[end].kind,
                ItemKind::MajorHeading | ItemKind::SectionRoot
            )
        {
            end += 1;
        }
        let counters = tally(&items[i + 1..end], |_| true);
        items[i].counters = Some(counters);
        i = end;
    }
}
