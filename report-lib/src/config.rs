use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Locale markers and layout constants used while building a report.
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Substring of `num` marking the first top-level section
    pub part_one_marker: String,
    /// Substring of `num` marking the second top-level section
    pub part_two_marker: String,
    /// Character in `num` turning a heading row into a note
    pub note_marker: char,
    /// Character in `num` marking a reference item
    pub reference_marker: char,
    /// Text preceding an image file name in `require`/`result`
    pub image_marker: String,
    pub fail_markers: Vec<String>,
    pub not_applicable_markers: Vec<String>,
    /// Canonical `result` text of a not-applicable item
    pub not_applicable_text: String,
    /// Comment used for not-applicable items without an explanation
    pub not_applicable_placeholder: String,
    /// Qualifiers removed from names in the not-applicable summary
    pub boilerplate_phrases: Vec<String>,
    /// Suffixes removed from the manufacturer in output file names
    pub company_suffixes: Vec<String>,
    pub subtotal_label: String,
    pub grand_total_label: String,
    /// Criteria allowed on the conclusion page before it is split
    pub max_criteria: usize,
    /// Extra criteria the raw record can hold on the same page
    pub record_extra_criteria: usize,
    pub image_width: ImageWidths,
    pub sheets: SheetNames,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageWidths {
    pub require_mm: u32,
    pub result_mm: u32,
    pub photo_mm: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub results: String,
    pub map: String,
    pub basic_info: String,
    pub photos: String,
    pub criteria: String,
    pub testers: String,
    pub instruments: String,
    pub attachments: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let strings = |values: &[&str]| values.iter().map(|s| s.to_string()).collect();
        ReportConfig {
            part_one_marker: "第一".to_string(),
            part_two_marker: "第二".to_string(),
            note_marker: '$',
            reference_marker: '*',
            image_marker: "图片".to_string(),
            fail_markers: strings(&["不合格", "F", "Fail", "Failed"]),
            not_applicable_markers: strings(&["/", "--", "不支持", "不适用", "允许不支持"]),
            not_applicable_text: "不适用".to_string(),
            not_applicable_placeholder: "被测设备不适用".to_string(),
            boilerplate_phrases: strings(&[
                "(设备支持该功能时测试)",
                "（设备支持该功能时测试）",
                "(适用于支持该功能的设备)",
                "（适用于支持该功能的设备）",
            ]),
            company_suffixes: strings(&[
                "科技发展股份有限公司",
                "科技股份有限公司",
                "技术股份有限公司",
                "产业股份有限公司",
                "科技有限责任公司",
                "科技有限公司",
                "技术有限公司",
                "股份有限公司",
                "有限责任公司",
                "有限公司",
            ]),
            subtotal_label: "合计".to_string(),
            grand_total_label: "共合计".to_string(),
            max_criteria: 10,
            record_extra_criteria: 4,
            image_width: ImageWidths::default(),
            sheets: SheetNames::default(),
        }
    }
}

impl Default for ImageWidths {
    fn default() -> Self {
        ImageWidths {
            require_mm: 54,
            result_mm: 20,
            photo_mm: 130,
        }
    }
}

impl Default for SheetNames {
    fn default() -> Self {
        SheetNames {
            results: "检验结果".to_string(),
            map: "map".to_string(),
            basic_info: "基本信息".to_string(),
            photos: "检验样品照片".to_string(),
            criteria: "检验依据".to_string(),
            testers: "检验人员".to_string(),
            instruments: "检验用仪表".to_string(),
            attachments: "附件".to_string(),
        }
    }
}

impl ReportConfig {
    /// Loads the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn is_fail_marker(&self, comment: &str) -> bool {
        self.fail_markers.iter().any(|marker| marker == comment)
    }

    pub fn is_not_applicable_marker(&self, result: &str) -> bool {
        self.not_applicable_markers.iter().any(|marker| marker == result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReportConfig::from_toml(
            r#"
            not_applicable_placeholder = "Not applicable to the equipment"
            fail_markers = ["NOK"]

            [sheets]
            results = "Results"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.not_applicable_placeholder,
            "Not applicable to the equipment"
        );
        assert!(config.is_fail_marker("NOK"));
        assert!(!config.is_fail_marker("Fail"));
        assert_eq!(config.sheets.results, "Results");
        assert_eq!(config.sheets.map, "map");
        assert_eq!(config.max_criteria, 10);
        assert_eq!(config.image_width.require_mm, 54);
    }

    #[test]
    fn test_markers_match_exactly() {
        let config = ReportConfig::default();
        assert!(config.is_not_applicable_marker("/"));
        assert!(config.is_not_applicable_marker("允许不支持"));
        assert!(!config.is_not_applicable_marker("不支持 "));
        assert!(config.is_fail_marker("F"));
        assert!(!config.is_fail_marker("f"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ReportConfig::from_toml("max_criteria = \"ten\"").is_err());
    }
}
