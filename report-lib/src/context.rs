use serde::Serialize;
use std::collections::BTreeMap;

use crate::assembler::{NotSupportRow, PAGE_BREAK, ResultGroup, TocRow};
use crate::pipeline::ReportError;
use crate::sections::{Criteria, InstrumentRow, NumberedImage, TesterRow};

/// Everything the document template is rendered with.
///
/// Task information fields are flattened into the top level under the keys
/// given by the map sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContext {
    #[serde(flatten)]
    pub info: BTreeMap<String, String>,
    pub equipment_images: Vec<NumberedImage>,
    #[serde(flatten)]
    pub criteria: Criteria,
    pub tbl_result: Vec<ResultGroup>,
    /// Only present in the formal report
    #[serde(flatten)]
    pub summary: Option<ReportSummary>,
    pub tbl_tester: Vec<TesterRow>,
    pub tbl_instrument: Vec<InstrumentRow>,
    pub attachment_images: Vec<NumberedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub conclusion1: String,
    pub conclusion2: String,
    pub tbl_toc: Vec<TocRow>,
    #[serde(rename = "tbl_notSupport")]
    pub tbl_not_support: Vec<NotSupportRow>,
}

impl ReportContext {
    /// JSON value handed to the renderer, including the page break glyph.
    pub fn to_value(&self) -> Result<serde_json::Value, ReportError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.insert("newpage".to_string(), PAGE_BREAK.into());
        }
        Ok(value)
    }
}
