use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ReportConfig;
use crate::pipeline::{DocumentKind, ReportError};
use crate::utils::{sanitize_file_name, simplify_company_name};

/// Where the files of one generated document are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `{report_number}_{manufacturer}_{equipment_type}_{equipment_model}` next to the workbook
    pub dir: PathBuf,
    /// `{report_number}_{报告|记录}_{manufacturer}_{equipment_type}_{equipment_model}`
    pub stem: String,
    pub report_number: String,
}

impl OutputPaths {
    pub fn new(
        workbook_dir: &Path,
        task_info: &BTreeMap<String, String>,
        kind: DocumentKind,
        config: &ReportConfig,
    ) -> Result<Self, ReportError> {
        let field = |key: &str| {
            task_info
                .get(key)
                .cloned()
                .ok_or_else(|| ReportError::UnfilledField {
                    sheet: config.sheets.basic_info.clone(),
                    field: key.to_string(),
                })
        };
        let report_number = field("report_number")?;
        let manufacturer = simplify_company_name(&field("manufacturer")?, &config.company_suffixes);
        let equipment = format!(
            "{manufacturer}_{}_{}",
            field("equipment_type")?,
            field("equipment_model")?
        );

        let dir_name = sanitize_file_name(&format!("{report_number}_{equipment}"));
        let stem = sanitize_file_name(&format!("{report_number}_{}_{equipment}", kind.label()));

        Ok(OutputPaths {
            dir: workbook_dir.join(dir_name),
            stem,
            report_number,
        })
    }

    /// Output file with the document stem and the given extension.
    pub fn document(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{extension}", self.stem))
    }

    pub fn context_file(&self) -> PathBuf {
        self.document("json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_info() -> BTreeMap<String, String> {
        [
            ("report_number", "BD2024-017"),
            ("manufacturer", "北京博鼎科技有限公司"),
            ("equipment_type", "工业交换机"),
            ("equipment_model", "SW 3000/A"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_output_paths_for_report() {
        let paths = OutputPaths::new(
            Path::new("/data"),
            &task_info(),
            DocumentKind::Report,
            &ReportConfig::default(),
        )
        .unwrap();

        assert_eq!(
            paths.dir,
            Path::new("/data").join("BD2024-017_北京博鼎_工业交换机_SW-3000-A")
        );
        assert_eq!(paths.stem, "BD2024-017_报告_北京博鼎_工业交换机_SW-3000-A");
        assert_eq!(
            paths.context_file().file_name().unwrap(),
            "BD2024-017_报告_北京博鼎_工业交换机_SW-3000-A.json"
        );
    }

    #[test]
    fn test_missing_report_number_is_unfilled() {
        let mut info = task_info();
        info.remove("report_number");
        let result = OutputPaths::new(
            Path::new("."),
            &info,
            DocumentKind::Record,
            &ReportConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ReportError::UnfilledField { ref field, .. }) if field == "report_number"
        ));
    }
}
