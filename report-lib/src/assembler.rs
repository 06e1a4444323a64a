//! Derived views over the aggregated test items.
//!
//! Every view is computed from the same finished item sequence and never
//! changes it, so each can be built independently and repeatedly.

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::aggregator::tally;
use crate::config::ReportConfig;
use crate::model::{CellValue, ClassifiedItem, Counters, ItemKind, Part, Stub, Verdict};
use crate::numeric::format_run_lengths;
use crate::utils::{strip_phrases, toc_title};

/// Line break inside a rendered table cell or paragraph.
pub const LINE_BREAK: &str = "\u{7}";
/// Page break in rendered text.
pub const PAGE_BREAK: &str = "\u{c}";

/// One block of the result table: a heading, a note, or one test item with its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup {
    #[serde(rename = "type")]
    pub kind: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<String>,
    pub title: String,
    pub data: Vec<ResultRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub num: String,
    pub name: String,
    pub subname: String,
    pub unit: String,
    pub require: CellValue,
    pub result: CellValue,
    pub verdict: String,
    pub comment: String,
}

/// A count column of the table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocCell {
    Count(usize),
    /// Shown as "--" for headings without tested items
    Dash,
}

impl Serialize for TocCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TocCell::Count(count) => serializer.serialize_u64(*count as u64),
            TocCell::Dash => serializer.serialize_str("--"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TocCounts {
    pub tested: TocCell,
    pub total: TocCell,
    pub pass: TocCell,
    pub fail: TocCell,
    #[serde(rename = "ref")]
    pub reference: TocCell,
    #[serde(rename = "notSupport")]
    pub not_support: TocCell,
}

impl From<Counters> for TocCounts {
    fn from(counters: Counters) -> Self {
        let cell = |count: usize| {
            if counters.tested() == 0 {
                TocCell::Dash
            } else {
                TocCell::Count(count)
            }
        };
        TocCounts {
            tested: cell(counters.tested()),
            total: cell(counters.total()),
            pass: cell(counters.pass),
            fail: cell(counters.fail),
            reference: cell(counters.reference),
            not_support: cell(counters.not_applicable),
        }
    }
}

/// Row of the table of contents.
///
/// `type` 1 is a title-only row, `type` 2 carries counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocRow {
    #[serde(rename = "type")]
    pub row_type: u8,
    pub num: String,
    pub title: String,
    #[serde(flatten)]
    pub counts: Option<TocCounts>,
}

impl TocRow {
    fn totals(label: &str, counters: Counters) -> Self {
        TocRow {
            row_type: 2,
            num: label.to_string(),
            title: String::new(),
            counts: Some(counters.into()),
        }
    }
}

/// Row of the not-applicable summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotSupportRow {
    pub num: String,
    pub name: String,
    pub comment: String,
}

pub struct ReportAssembler<'a> {
    items: &'a [ClassifiedItem],
    config: &'a ReportConfig,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(items: &'a [ClassifiedItem], config: &'a ReportConfig) -> Self {
        ReportAssembler { items, config }
    }

    //////////////////////////////////////////////////////////////
    ///  Result table
    //////////////////////////////////////////////////////////////

    /// Partition the items into display groups.
    ///
    /// Reference verdicts are shown with the not-applicable glyph here only.
    pub fn result_table(&self) -> Vec<ResultGroup> {
        let items = self.items;
        let mut groups = Vec::new();
        let mut i = 0;
        while i < items.len() {
            let item = &items[i];
            match item.kind {
                ItemKind::Malformed => {
                    debug!("row {} left out of the result table", item.source_row);
                    i += 1;
                }
                ItemKind::GroupHeadItem | ItemKind::SubgroupHeadItem => {
                    let mut end = i + 1;
                    while end < items.len() && items[end].kind.is_group_member() {
                        end += 1;
                    }
                    groups.push(ResultGroup {
                        kind: item.kind.code(),
                        num: None,
                        title: item.name.clone(),
                        data: items[i..end].iter().map(result_row).collect(),
                    });
                    i = end;
                }
                kind if kind.is_test_item() => {
                    groups.push(ResultGroup {
                        kind: kind.code(),
                        num: None,
                        title: item.name.clone(),
                        data: vec![result_row(item)],
                    });
                    i += 1;
                }
                kind => {
                    groups.push(ResultGroup {
                        kind: kind.code(),
                        num: Some(item.num.clone()),
                        title: item.name.clone(),
                        data: Vec::new(),
                    });
                    i += 1;
                }
            }
        }
        groups
    }

    //////////////////////////////////////////////////////////////
    ///  Table of contents
    //////////////////////////////////////////////////////////////

    /// Heading rows per part, each part closed by a subtotal, then a grand total.
    pub fn toc(&self) -> Vec<TocRow> {
        let mut rows = Vec::new();
        let mut grand_total = Counters::default();

        for part in Part::ALL {
            let headings: Vec<&ClassifiedItem> = self
                .items
                .iter()
                .filter(|item| item.is_heading() && item.part == part)
                .collect();
            if headings.is_empty() {
                continue;
            }

            for heading in &headings {
                let counts: Option<TocCounts> = heading
                    .is_leaf_heading()
                    .then(|| heading.counters.unwrap_or_default().into());
                rows.push(TocRow {
                    row_type: if counts.is_some() { 2 } else { 1 },
                    num: heading.num.clone(),
                    title: toc_title(&heading.name),
                    counts,
                });
            }

            let subtotal = part_subtotal(&headings);
            grand_total += subtotal;
            rows.push(TocRow::totals(&self.config.subtotal_label, subtotal));
        }

        rows.push(TocRow::totals(&self.config.grand_total_label, grand_total));
        rows
    }

    //////////////////////////////////////////////////////////////
    ///  Not-applicable summary
    //////////////////////////////////////////////////////////////

    /// Consecutive not-applicable items merge into one `start~end` row when
    /// their numbers are adjacent and both `name` and `comment` are equal.
    pub fn not_support(&self) -> Vec<NotSupportRow> {
        let mut rows = Vec::new();
        let mut current: Option<NotSupportRun<'_>> = None;

        for item in self.not_applicable_items() {
            let comment = if item.comment.is_empty() {
                self.config.not_applicable_placeholder.as_str()
            } else {
                item.comment.as_str()
            };
            let number = item.sequence_number();

            if let Some(run) = current.as_mut()
                && run.accepts(number, &item.name, comment)
            {
                run.end = number;
                continue;
            }
            if let Some(run) = current.take() {
                rows.push(run.into_row());
            }
            current = Some(NotSupportRun {
                first: item,
                start: number,
                end: number,
                comment,
            });
        }
        if let Some(run) = current {
            rows.push(run.into_row());
        }

        for row in &mut rows {
            row.name = strip_phrases(&row.name, &self.config.boilerplate_phrases);
        }
        rows
    }

    fn not_applicable_items(&self) -> impl Iterator<Item = &'a ClassifiedItem> + use<'a> {
        self.items
            .iter()
            .filter(|item| item.is_test_item() && item.verdict == Some(Verdict::NotApplicable))
    }

    //////////////////////////////////////////////////////////////
    ///  Conclusion
    //////////////////////////////////////////////////////////////

    /// Conclusion paragraph of the given part.
    pub fn conclusion(&self, part: Part) -> String {
        let in_part = |item: &ClassifiedItem| item.part == part;
        let counters = tally(self.items, in_part);
        if counters.total() == 0 {
            return "应测项：根据被检设备情况及相应标准，共0项。".to_string();
        }

        let numbers_with = |verdict: Verdict| {
            let numbers: Vec<&str> = self
                .items
                .iter()
                .filter(|item| {
                    item.is_test_item() && in_part(*item) && item.verdict == Some(verdict)
                })
                .map(|item| item.num.as_str())
                .collect();
            if numbers.is_empty() {
                String::new()
            } else {
                format!("（第{}项）", format_run_lengths(&numbers))
            }
        };

        let mut text = format!(
            "应测项：根据被检设备情况及相应标准，共{}项；{LINE_BREAK}",
            counters.total()
        );
        text.push_str(&format!(
            "允许不支持项：共{}项{}；{LINE_BREAK}",
            counters.not_applicable,
            numbers_with(Verdict::NotApplicable)
        ));
        text.push_str(&format!(
            "实测项：共{}项，其中参考项{}项{}不做判定；{LINE_BREAK}",
            counters.tested(),
            counters.reference,
            numbers_with(Verdict::Reference)
        ));
        text.push_str(&format!(
            "不合格项：共{}项{}；{LINE_BREAK}结论：合格",
            counters.fail,
            numbers_with(Verdict::Fail)
        ));
        text
    }
}

fn result_row(item: &ClassifiedItem) -> ResultRow {
    let verdict = match item.verdict {
        Some(Verdict::Reference) => Verdict::NotApplicable.glyph().to_string(),
        Some(verdict) => verdict.glyph().to_string(),
        None => String::new(),
    };
    ResultRow {
        num: item.num.clone(),
        name: item.name.clone(),
        subname: item.subname.clone(),
        unit: item.unit.clone(),
        require: item.require.clone(),
        result: item.result.clone(),
        verdict,
        comment: item.comment.clone(),
    }
}

/// Sum the rolled-up counters of the headings of one part.
///
/// Major headings already cover everything up to the next major heading, so
/// only tested leaves outside any major heading are added on their own.
fn part_subtotal(headings: &[&ClassifiedItem]) -> Counters {
    let mut subtotal = Counters::default();
    let mut inside_major = false;
    for heading in headings {
        match heading.kind {
            ItemKind::MajorHeading if heading.stub == Some(Stub::LeafUntested) => {
                inside_major = false;
            }
            ItemKind::MajorHeading => {
                inside_major = true;
                subtotal += heading.counters.unwrap_or_default();
            }
            ItemKind::SectionRoot => {
                inside_major = false;
                if heading.stub == Some(Stub::LeafTested) {
                    subtotal += heading.counters.unwrap_or_default();
                }
            }
            _ => {
                if !inside_major && heading.stub == Some(Stub::LeafTested) {
                    subtotal += heading.counters.unwrap_or_default();
                }
            }
        }
    }
    subtotal
}

struct NotSupportRun<'a> {
    first: &'a ClassifiedItem,
    start: Option<u32>,
    end: Option<u32>,
    comment: &'a str,
}

impl NotSupportRun<'_> {
    fn accepts(&self, number: Option<u32>, name: &str, comment: &str) -> bool {
        let adjacent = matches!((self.end, number), (Some(end), Some(next)) if next == end + 1);
        adjacent && name == self.first.name && comment == self.comment
    }

    fn into_row(self) -> NotSupportRow {
        let (num, name) = match (self.start, self.end) {
            (Some(start), Some(end)) if start != end => {
                (format!("{start}~{end}"), self.first.name.clone())
            }
            _ => {
                let name = if self.first.subname.is_empty() {
                    self.first.name.clone()
                } else {
                    format!("{} -- {}", self.first.name, self.first.subname)
                };
                let num = match self.start {
                    Some(start) => start.to_string(),
                    None => self.first.num.clone(),
                };
                (num, name)
            }
        };
        NotSupportRow {
            num,
            name,
            comment: self.comment.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawRow;

    fn item(num: &str, name: &str, verdict: Verdict, part: Part) -> ClassifiedItem {
        let row = RawRow {
            num: num.to_string(),
            name: name.to_string(),
            ..Default::default()
        };
        let mut item = ClassifiedItem::new(row, ItemKind::SimpleItem);
        item.verdict = Some(verdict);
        item.part = part;
        item
    }

    #[test]
    fn test_conclusion_without_items() {
        let config = ReportConfig::default();
        let items = vec![item("1", "A", Verdict::Pass, Part::One)];
        let assembler = ReportAssembler::new(&items, &config);
        assert_eq!(
            assembler.conclusion(Part::Two),
            "应测项：根据被检设备情况及相应标准，共0项。"
        );
    }

    #[test]
    fn test_toc_cell_serialization() {
        assert_eq!(serde_json::to_string(&TocCell::Count(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&TocCell::Dash).unwrap(), "\"--\"");
    }

    #[test]
    fn test_non_numeric_not_applicable_numbers_never_merge() {
        let config = ReportConfig::default();
        let items = vec![
            item("A.1", "Port", Verdict::NotApplicable, Part::One),
            item("A.2", "Port", Verdict::NotApplicable, Part::One),
        ];
        let rows = ReportAssembler::new(&items, &config).not_support();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].num, "A.1");
        assert_eq!(rows[1].comment, "被测设备不适用");
    }
}
