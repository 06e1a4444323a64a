use tracing::debug;

use crate::config::ReportConfig;
use crate::diagnostics::{DataQualityIssue, Diagnostics};
use crate::model::{CellValue, ClassifiedItem, Verdict};
use crate::resources::{FileCategory, FileResolver};

/// Sets the verdict of every test item and resolves embedded images.
pub struct VerdictResolver<'a> {
    config: &'a ReportConfig,
    resolver: &'a dyn FileResolver,
}

impl<'a> VerdictResolver<'a> {
    pub fn new(config: &'a ReportConfig, resolver: &'a dyn FileResolver) -> Self {
        VerdictResolver { config, resolver }
    }

    pub fn resolve(
        &self,
        items: Vec<ClassifiedItem>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ClassifiedItem> {
        items
            .into_iter()
            .map(|item| self.resolve_item(item, diagnostics))
            .collect()
    }

    fn resolve_item(
        &self,
        mut item: ClassifiedItem,
        diagnostics: &mut Diagnostics,
    ) -> ClassifiedItem {
        if !item.is_test_item() {
            item.verdict = None;
            return item;
        }

        let missing: Vec<&'static str> = [
            ("unit", item.unit.is_empty()),
            ("require", item.require.is_empty()),
            ("result", item.result.is_empty()),
        ]
        .into_iter()
        .filter_map(|(column, empty)| empty.then_some(column))
        .collect();
        if !missing.is_empty() {
            diagnostics.push(DataQualityIssue::IncompleteRow {
                row: item.source_row,
                columns: missing,
            });
        }

        item.require = self.embed_image(
            item.require,
            item.source_row,
            "require",
            FileCategory::Template,
            self.config.image_width.require_mm,
            diagnostics,
        );
        item.result = self.embed_image(
            item.result,
            item.source_row,
            "result",
            FileCategory::Images,
            self.config.image_width.result_mm,
            diagnostics,
        );

        item.verdict = Some(self.verdict_for(&mut item));
        item
    }

    /// Decide the verdict, canonicalizing the result text of not-applicable items.
    fn verdict_for(&self, item: &mut ClassifiedItem) -> Verdict {
        if self.config.is_fail_marker(&item.comment) {
            return Verdict::Fail;
        }
        let not_applicable = item
            .result
            .as_text()
            .is_some_and(|result| self.config.is_not_applicable_marker(result));
        if not_applicable {
            item.result = CellValue::Text(self.config.not_applicable_text.clone());
            return Verdict::NotApplicable;
        }
        if item.num.contains(self.config.reference_marker) {
            return Verdict::Reference;
        }
        Verdict::Pass
    }

    /// Replace a cell naming an image file with the image itself.
    ///
    /// The text is kept when the file cannot be found.
    fn embed_image(
        &self,
        cell: CellValue,
        row: usize,
        column: &'static str,
        category: FileCategory,
        width_mm: u32,
        diagnostics: &mut Diagnostics,
    ) -> CellValue {
        let Some(text) = cell.as_text() else {
            return cell;
        };
        let marker = self.config.image_marker.as_str();
        if marker.is_empty() || !text.contains(marker) {
            return cell;
        }
        let file = text.rsplit(marker).next().unwrap_or_default().trim();

        match self.resolver.resolve_file(file, category, None, diagnostics) {
            Some(path) => {
                debug!("row {row}: embedding image {}", path.display());
                CellValue::Image(self.resolver.emit_image(&path, Some(width_mm), None))
            }
            None => {
                diagnostics.push(DataQualityIssue::MissingImage {
                    row,
                    column,
                    file: file.to_string(),
                });
                cell
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKind, RawRow};
    use std::path::PathBuf;

    struct NoFiles;

    impl FileResolver for NoFiles {
        fn resolve_file(
            &self,
            _name: &str,
            _category: FileCategory,
            _display_name: Option<&str>,
            _diagnostics: &mut Diagnostics,
        ) -> Option<PathBuf> {
            None
        }
    }

    fn item(num: &str, result: &str, comment: &str) -> ClassifiedItem {
        let row = RawRow {
            num: num.to_string(),
            name: "Item".to_string(),
            unit: "V".to_string(),
            require: "≥1".to_string(),
            result: result.to_string(),
            comment: comment.to_string(),
            source_row: 3,
            ..Default::default()
        };
        ClassifiedItem::new(row, ItemKind::SimpleItem)
    }

    #[test]
    fn test_fail_comment_wins_over_not_applicable_result() {
        let config = ReportConfig::default();
        let resolver = VerdictResolver::new(&config, &NoFiles);
        let mut diagnostics = Diagnostics::new();

        let items = resolver.resolve(vec![item("1", "/", "Fail")], &mut diagnostics);

        assert_eq!(items[0].verdict, Some(Verdict::Fail));
        assert_eq!(items[0].result, CellValue::from("/"));
    }

    #[test]
    fn test_missing_image_keeps_text() {
        let config = ReportConfig::default();
        let resolver = VerdictResolver::new(&config, &NoFiles);
        let mut diagnostics = Diagnostics::new();

        let items = resolver.resolve(vec![item("1", "图片 eye.png", "")], &mut diagnostics);

        assert_eq!(items[0].result, CellValue::from("图片 eye.png"));
        assert_eq!(items[0].verdict, Some(Verdict::Pass));
        assert!(diagnostics.issues().contains(&DataQualityIssue::MissingImage {
            row: 3,
            column: "result",
            file: "eye.png".to_string(),
        }));
    }
}
