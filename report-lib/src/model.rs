use serde::Serialize;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::path::PathBuf;

/// One row of the "检验结果" sheet, exactly as read from the workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub num: String,
    pub name: String,
    pub subname: String,
    pub unit: String,
    pub require: String,
    pub result: String,
    pub comment: String,
    /// 1-based line number in the source sheet
    pub source_row: usize,
}

impl RawRow {
    /// Build a row from the seven result columns plus the source row number.
    ///
    /// Missing trailing cells are treated as empty.
    pub fn from_cells(cells: &[String], source_row: usize) -> Self {
        let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();
        RawRow {
            num: cell(0),
            name: cell(1),
            subname: cell(2),
            unit: cell(3),
            require: cell(4),
            result: cell(5),
            comment: cell(6),
            source_row,
        }
    }
}

/// Semantic type of a classified row.
///
/// Every kind keeps the numeric type code used by the document templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// "第一部分"/"第二部分" marker
    SectionRoot,
    /// First-level heading
    MajorHeading,
    /// Any other heading
    MinorHeading,
    /// Free text, never a test item
    Note,
    /// A test item occupying a single row
    SimpleItem,
    /// First row of an item whose rows share one name
    GroupHeadItem,
    GroupMemberItem,
    /// First row of an item whose rows share name and subname
    SubgroupHeadItem,
    SubgroupMemberItem,
    /// Row matching no known layout
    Malformed,
}

impl ItemKind {
    pub fn code(self) -> u16 {
        match self {
            ItemKind::SectionRoot => 0,
            ItemKind::MajorHeading => 1,
            ItemKind::MinorHeading => 2,
            ItemKind::Note => 10,
            ItemKind::SimpleItem => 11,
            ItemKind::GroupHeadItem => 12,
            ItemKind::SubgroupHeadItem => 13,
            ItemKind::Malformed => 21,
            ItemKind::GroupMemberItem => 120,
            ItemKind::SubgroupMemberItem => 130,
        }
    }

    pub fn is_heading(self) -> bool {
        matches!(
            self,
            ItemKind::SectionRoot | ItemKind::MajorHeading | ItemKind::MinorHeading
        )
    }

    /// Kinds that carry a verdict and take part in statistics.
    pub fn is_test_item(self) -> bool {
        matches!(
            self,
            ItemKind::SimpleItem
                | ItemKind::GroupHeadItem
                | ItemKind::GroupMemberItem
                | ItemKind::SubgroupHeadItem
                | ItemKind::SubgroupMemberItem
        )
    }

    pub fn is_group_member(self) -> bool {
        matches!(
            self,
            ItemKind::GroupMemberItem | ItemKind::SubgroupMemberItem
        )
    }
}

/// Top-level section a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Part {
    #[default]
    One,
    Two,
}

impl Part {
    pub const ALL: [Part; 2] = [Part::One, Part::Two];

    pub fn number(self) -> u8 {
        match self {
            Part::One => 1,
            Part::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
    NotApplicable,
    Reference,
}

impl Verdict {
    /// Text shown in the generated documents.
    pub fn glyph(self) -> &'static str {
        match self {
            Verdict::Pass => "合格",
            Verdict::Fail => "不合格",
            Verdict::NotApplicable => "--",
            Verdict::Reference => "ref",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Verdict tallies of a heading scope.
///
/// `tested` and `total` are always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub pass: usize,
    pub fail: usize,
    pub not_applicable: usize,
    pub reference: usize,
}

impl Counters {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.pass += 1,
            Verdict::Fail => self.fail += 1,
            Verdict::NotApplicable => self.not_applicable += 1,
            Verdict::Reference => self.reference += 1,
        }
    }

    pub fn tested(&self) -> usize {
        self.pass + self.fail + self.reference
    }

    pub fn total(&self) -> usize {
        self.tested() + self.not_applicable
    }
}

impl FromIterator<Verdict> for Counters {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        let mut counters = Counters::default();
        for verdict in iter {
            counters.record(verdict);
        }
        counters
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, other: Self) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.not_applicable += other.not_applicable;
        self.reference += other.reference;
    }
}

impl Add for Counters {
    type Output = Counters;

    fn add(mut self, other: Self) -> Counters {
        self += other;
        self
    }
}

impl Sum for Counters {
    fn sum<I: Iterator<Item = Counters>>(iter: I) -> Self {
        iter.fold(Counters::default(), Add::add)
    }
}

/// Leaf status of a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stub {
    /// Not a leaf, or a leaf holding only notes
    NonLeaf,
    /// Leaf whose items are all not applicable
    LeafUntested,
    /// Leaf with at least one tested item
    LeafTested,
}

/// Opaque handle to an image placed in the rendered document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageHandle {
    pub path: PathBuf,
    /// Rendered width in millimetres; `None` keeps the natural size
    pub width_mm: Option<u32>,
    pub name: String,
}

/// Content of the `require`/`result` cells after image resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Image(ImageHandle),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::Image(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(text) if text.is_empty())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

/// A row after classification, carried through verdict resolution and aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedItem {
    pub num: String,
    pub name: String,
    pub subname: String,
    pub unit: String,
    pub require: CellValue,
    pub result: CellValue,
    pub comment: String,
    pub source_row: usize,
    pub kind: ItemKind,
    pub part: Part,
    /// Depth of the dotted numeral in `num`
    pub level: usize,
    pub verdict: Option<Verdict>,
    pub counters: Option<Counters>,
    pub stub: Option<Stub>,
}

impl ClassifiedItem {
    pub fn new(row: RawRow, kind: ItemKind) -> Self {
        ClassifiedItem {
            level: dotted_level(&row.num),
            num: row.num,
            name: row.name,
            subname: row.subname,
            unit: row.unit,
            require: CellValue::Text(row.require),
            result: CellValue::Text(row.result),
            comment: row.comment,
            source_row: row.source_row,
            kind,
            part: Part::One,
            verdict: None,
            counters: None,
            stub: None,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind.is_heading()
    }

    pub fn is_test_item(&self) -> bool {
        self.kind.is_test_item()
    }

    /// Sequential number with the reference prefix removed, when numeric.
    pub fn sequence_number(&self) -> Option<u32> {
        self.num.replace('*', "").trim().parse().ok()
    }

    /// Leaf headings have their own counters in the table of contents.
    pub fn is_leaf_heading(&self) -> bool {
        self.is_heading() && matches!(self.stub, Some(Stub::LeafTested | Stub::LeafUntested))
    }
}

/// Count of dotted segments in an item number, ignoring one trailing dot.
pub fn dotted_level(num: &str) -> usize {
    let segments: Vec<&str> = num.split('.').collect();
    match segments.last() {
        Some(last) if last.is_empty() => segments.len() - 1,
        _ => segments.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_level() {
        assert_eq!(dotted_level("1"), 1);
        assert_eq!(dotted_level("1."), 1);
        assert_eq!(dotted_level("2.3"), 2);
        assert_eq!(dotted_level("2.3.1"), 3);
        assert_eq!(dotted_level(""), 0);
    }

    #[test]
    fn test_counters_derive_tested_and_total() {
        let counters: Counters = [
            Verdict::Pass,
            Verdict::Pass,
            Verdict::Fail,
            Verdict::Reference,
            Verdict::NotApplicable,
        ]
        .into_iter()
        .collect();

        assert_eq!(counters.tested(), 4);
        assert_eq!(counters.total(), 5);
        assert_eq!(counters.not_applicable, 1);
    }

    #[test]
    fn test_counters_sum() {
        let a = Counters { pass: 1, fail: 2, not_applicable: 3, reference: 4 };
        let b = Counters { pass: 10, ..Default::default() };
        let total: Counters = [a, b].into_iter().sum();
        assert_eq!(total.pass, 11);
        assert_eq!(total.total(), 20);
    }

    #[test]
    fn test_raw_row_from_short_cells() {
        let cells = vec!["1".to_string(), "Name".to_string()];
        let row = RawRow::from_cells(&cells, 7);
        assert_eq!(row.name, "Name");
        assert_eq!(row.comment, "");
        assert_eq!(row.source_row, 7);
    }

    #[test]
    fn test_sequence_number_strips_reference_marker() {
        let mut item = ClassifiedItem::new(RawRow::default(), ItemKind::SimpleItem);
        item.num = "*12".to_string();
        assert_eq!(item.sequence_number(), Some(12));
        item.num = "1.2".to_string();
        assert_eq!(item.sequence_number(), None);
    }
}
