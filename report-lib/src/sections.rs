//! Readers for the workbook sheets around the results table.
//!
//! Each reader returns its typed part of the rendering context. Missing
//! required sheets end the document with a [`ReportError`]; everything else is
//! recorded in [`Diagnostics`].

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::assembler::{LINE_BREAK, PAGE_BREAK};
use crate::config::ReportConfig;
use crate::diagnostics::{DataQualityIssue, Diagnostics};
use crate::model::{ImageHandle, RawRow};
use crate::pipeline::{DocumentKind, ReportError};
use crate::resources::{FileCategory, FileResolver};
use crate::utils::collapse_whitespace;
use crate::workbook::{Area, SheetRef, SheetRow, SheetSource};

const HIDE_FLAG: &str = "是";
const INSTRUMENT_IN_SERVICE: &str = "正常";
const INSTRUMENT_COLUMNS: usize = 10;
const RESULT_COLUMNS: u32 = 7;

/// An image placed in a numbered list of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberedImage {
    pub num: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub image: ImageHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
    pub num: String,
    pub sn: String,
    pub name: String,
}

/// Test criteria, both as a table and as one line-broken paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Criteria {
    #[serde(rename = "tbl_criteria")]
    pub table: Vec<Criterion>,
    #[serde(rename = "str_criteria")]
    pub text: String,
    /// Too many criteria for the conclusion page
    pub has_two: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TesterRow {
    /// 2 when tester, auditor and date are all given, otherwise 1
    #[serde(rename = "type")]
    pub row_type: u8,
    pub num: String,
    pub title: String,
    pub tester: String,
    pub auditor: String,
    pub date: String,
}

/// An instrument in service: its sequence number and ten descriptive cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRow {
    pub num: usize,
    pub cells: Vec<String>,
}

impl Serialize for InstrumentRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cells.len() + 1))?;
        seq.serialize_element(&self.num)?;
        for cell in &self.cells {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

fn required_rows<S: SheetSource>(
    source: &mut S,
    sheet: &str,
    area: Area,
) -> Result<Vec<SheetRow>, ReportError> {
    match source.read_region(SheetRef::Name(sheet), area)? {
        Some(rows) if !rows.is_empty() => Ok(rows),
        _ => Err(ReportError::MissingSheet(sheet.to_string())),
    }
}

fn optional_rows<S: SheetSource>(
    source: &mut S,
    sheet: &str,
    area: Area,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<SheetRow>, ReportError> {
    match source.read_region(SheetRef::Name(sheet), area)? {
        Some(rows) => Ok(rows),
        None => {
            diagnostics.push(DataQualityIssue::MissingOptionalSheet {
                sheet: sheet.to_string(),
            });
            Ok(Vec::new())
        }
    }
}

fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map(String::as_str).unwrap_or_default()
}

/// Read the seven result columns of the results sheet from row 2 on.
pub fn read_result_rows<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
) -> Result<Vec<RawRow>, ReportError> {
    let rows = required_rows(
        source,
        &config.sheets.results,
        Area::columns_from(2, 1, RESULT_COLUMNS),
    )?;
    debug!("read {} result rows", rows.len());
    Ok(rows
        .into_iter()
        .map(|(row, cells)| RawRow::from_cells(&cells, row))
        .collect())
}

/// Map the labelled values of the basic information sheet to template keys.
///
/// The photo sheet contributes two more labelled values (rows 2 and 3).
pub fn read_task_info<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeMap<String, String>, ReportError> {
    let sheets = &config.sheets;

    let keys: BTreeMap<String, String> =
        required_rows(source, &sheets.map, Area::columns_from(2, 3, 4))?
            .into_iter()
            .filter(|(_, cells)| !cell(cells, 1).is_empty())
            .map(|(_, cells)| (collapse_whitespace(cell(&cells, 0)), cell(&cells, 1).to_string()))
            .collect();

    let mut info = BTreeMap::new();
    for (_, cells) in required_rows(source, &sheets.basic_info, Area::columns_from(2, 3, 4))? {
        let (label, value) = (cell(&cells, 0), cell(&cells, 1));
        if label.is_empty() {
            continue;
        }
        if value.is_empty() {
            return Err(ReportError::UnfilledField {
                sheet: sheets.basic_info.clone(),
                field: label.to_string(),
            });
        }
        insert_labelled(&mut info, &keys, &sheets.basic_info, label, value, diagnostics);
    }

    if info.get("toc_other").is_some_and(|other| other.chars().count() < 2) {
        info.insert("toc_other".to_string(), String::new());
    }

    for (_, cells) in required_rows(source, &sheets.photos, Area::new(2, Some(3), 2, Some(3)))? {
        let (label, value) = (cell(&cells, 0), cell(&cells, 1));
        if !value.is_empty() {
            insert_labelled(&mut info, &keys, &sheets.photos, label, value, diagnostics);
        }
    }

    info!("read {} task information fields", info.len());
    Ok(info)
}

fn insert_labelled(
    info: &mut BTreeMap<String, String>,
    keys: &BTreeMap<String, String>,
    sheet: &str,
    label: &str,
    value: &str,
    diagnostics: &mut Diagnostics,
) {
    match keys.get(&collapse_whitespace(label)) {
        Some(key) => {
            info.insert(key.clone(), value.to_string());
        }
        None => diagnostics.push(DataQualityIssue::UnmappedLabel {
            sheet: sheet.to_string(),
            label: label.to_string(),
        }),
    }
}

/// Equipment photos listed from row 6 of the photo sheet.
///
/// Photos flagged as hidden are left out of the formal report only.
pub fn read_equipment_photos<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
    kind: DocumentKind,
    resolver: &dyn FileResolver,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<NumberedImage>, ReportError> {
    let rows = required_rows(source, &config.sheets.photos, Area::columns_from(6, 2, 4))?;

    let mut images = Vec::new();
    for (_, cells) in rows {
        let (title, file, hide) = (cell(&cells, 0), cell(&cells, 1), cell(&cells, 2));
        if (kind == DocumentKind::Report && hide == HIDE_FLAG) || file.is_empty() {
            continue;
        }
        let Some(path) = resolver.resolve_file(file, FileCategory::Images, None, diagnostics)
        else {
            continue;
        };
        let name = (!title.is_empty()).then_some(title);
        let image = resolver.emit_image(&path, Some(config.image_width.photo_mm), name);
        images.push(NumberedImage {
            num: (images.len() + 1).to_string(),
            title: None,
            image,
        });
    }
    Ok(images)
}

/// Numbered criteria from the criteria sheet.
///
/// Past the page limit (cell D34 of the basic information sheet, four more
/// for the raw record) the criteria move to a page of their own.
pub fn read_criteria<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
    kind: DocumentKind,
) -> Result<Criteria, ReportError> {
    let rows = required_rows(source, &config.sheets.criteria, Area::columns_from(2, 1, 3))?;

    let table: Vec<Criterion> = rows
        .iter()
        .filter(|(_, cells)| !cell(cells, 2).is_empty())
        .enumerate()
        .map(|(i, (_, cells))| Criterion {
            num: format!("{}.", i + 1),
            sn: cell(cells, 1).to_string(),
            name: cell(cells, 2).to_string(),
        })
        .collect();
    let text = table
        .iter()
        .map(|c| format!("{}  {} {}", c.num, c.sn, c.name))
        .collect::<Vec<_>>()
        .join(LINE_BREAK);

    let configured = source
        .cell(SheetRef::Name(&config.sheets.basic_info), 34, 4)?
        .and_then(|value| value.parse::<usize>().ok());
    let mut max_criteria = configured.unwrap_or(config.max_criteria);
    if kind == DocumentKind::Record {
        max_criteria += config.record_extra_criteria;
    }
    info!("at most {max_criteria} criteria on the conclusion page");

    let has_two = table.len() > max_criteria;
    if has_two {
        info!("{} criteria, moving them to a separate page", table.len());
    }
    Ok(Criteria {
        table,
        text,
        has_two,
        two_title: has_two.then(|| format!("{PAGE_BREAK}检验依据：")),
    })
}

/// Testers per test item; rows need a number and an item name.
pub fn read_testers<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
) -> Result<Vec<TesterRow>, ReportError> {
    let rows = required_rows(source, &config.sheets.testers, Area::columns_from(2, 1, 5))?;

    Ok(rows
        .iter()
        .filter(|(_, cells)| !cell(cells, 0).is_empty() && !cell(cells, 1).is_empty())
        .map(|(_, cells)| {
            let signed = (2..5).all(|i| !cell(cells, i).is_empty());
            let signature = |i: usize| if signed { cell(cells, i).to_string() } else { String::new() };
            TesterRow {
                row_type: if signed { 2 } else { 1 },
                num: cell(cells, 0).to_string(),
                title: cell(cells, 1).to_string(),
                tester: signature(2),
                auditor: signature(3),
                date: signature(4),
            }
        })
        .collect())
}

/// Instruments whose status column reads "正常", renumbered from 1.
pub fn read_instruments<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<InstrumentRow>, ReportError> {
    let rows = optional_rows(
        source,
        &config.sheets.instruments,
        Area::columns_from(2, 1, 11),
        diagnostics,
    )?;

    Ok(rows
        .iter()
        .filter(|(_, cells)| cell(cells, 9).contains(INSTRUMENT_IN_SERVICE))
        .enumerate()
        .map(|(i, (_, cells))| InstrumentRow {
            num: i + 1,
            cells: (1..=INSTRUMENT_COLUMNS)
                .map(|col| match cell(cells, col) {
                    "" => "--".to_string(),
                    text => text.to_string(),
                })
                .collect(),
        })
        .collect())
}

/// Attachment images from rows 3 to 20 of the attachment sheet.
pub fn read_attachment_images<S: SheetSource>(
    source: &mut S,
    config: &ReportConfig,
    kind: DocumentKind,
    resolver: &dyn FileResolver,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<NumberedImage>, ReportError> {
    let rows = optional_rows(
        source,
        &config.sheets.attachments,
        Area::new(3, Some(20), 2, Some(5)),
        diagnostics,
    )?;

    let mut images = Vec::new();
    for (_, cells) in rows {
        let (title, name, file, hide) = (
            cell(&cells, 0),
            cell(&cells, 1),
            cell(&cells, 2),
            cell(&cells, 3),
        );
        if (kind == DocumentKind::Report && hide == HIDE_FLAG) || file.is_empty() {
            continue;
        }
        let Some(path) = resolver.resolve_file(file, FileCategory::Images, None, diagnostics)
        else {
            continue;
        };
        let name = if name.is_empty() {
            file.rsplit_once('.').map_or(file, |(stem, _)| stem)
        } else {
            name
        };
        let image = resolver.emit_image(&path, Some(config.image_width.photo_mm), Some(name));
        images.push(NumberedImage {
            num: (images.len() + 1).to_string(),
            title: (!title.is_empty()).then(|| title.to_string()),
            image,
        });
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_row_serializes_as_list() {
        let row = InstrumentRow {
            num: 1,
            cells: vec!["示波器".to_string(), "--".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!([1, "示波器", "--"])
        );
    }

    #[test]
    fn test_criteria_title_only_when_split() {
        let criteria = Criteria::default();
        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value["has_two"], false);
        assert!(value.get("two_title").is_none());
        assert!(value.get("tbl_criteria").is_some());
    }
}
