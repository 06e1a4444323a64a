use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::diagnostics::{DataQualityIssue, Diagnostics};
use crate::model::ImageHandle;
use crate::utils::copy_into_dir;

/// Folder a referenced file is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Images shipped with the document templates
    Template,
    /// `images/` next to the workbook
    Images,
    /// `data/` next to the workbook
    Data,
}

impl FileCategory {
    fn folder(self) -> &'static str {
        match self {
            FileCategory::Template => "",
            FileCategory::Images => "images",
            FileCategory::Data => "data",
        }
    }
}

/// Resolves files referenced from the workbook and wraps images for embedding.
pub trait FileResolver {
    /// `display_name` replaces the file name of the copy kept with the output.
    fn resolve_file(
        &self,
        name: &str,
        category: FileCategory,
        display_name: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Option<PathBuf>;

    fn emit_image(&self, file: &Path, width_mm: Option<u32>, name: Option<&str>) -> ImageHandle {
        let name = match name {
            Some(name) => name.to_string(),
            None => file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        ImageHandle {
            path: file.to_path_buf(),
            width_mm,
            name,
        }
    }
}

/// Looks files up on disk relative to the workbook and template folders.
///
/// Files found outside the template folder are copied to `<output>/others`
/// prefixed with the report number, so the output folder is self-contained.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    workbook_dir: PathBuf,
    template_dir: PathBuf,
    output_dir: Option<PathBuf>,
    report_number: String,
}

impl DirectoryResolver {
    pub fn new(workbook_dir: &Path, template_dir: &Path) -> Self {
        DirectoryResolver {
            workbook_dir: workbook_dir.to_path_buf(),
            template_dir: template_dir.to_path_buf(),
            output_dir: None,
            report_number: String::new(),
        }
    }

    /// Enable copying of resolved files into the output folder.
    pub fn with_output(mut self, output_dir: &Path, report_number: &str) -> Self {
        self.output_dir = Some(output_dir.to_path_buf());
        self.report_number = report_number.to_string();
        self
    }

    fn locate(&self, name: &str, category: FileCategory) -> PathBuf {
        if name.contains('/') || name.contains('\\') {
            return PathBuf::from(name);
        }
        match category {
            FileCategory::Template => self.template_dir.join(name.trim()),
            _ => self.workbook_dir.join(category.folder()).join(name.trim()),
        }
    }
}

impl FileResolver for DirectoryResolver {
    fn resolve_file(
        &self,
        name: &str,
        category: FileCategory,
        display_name: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Option<PathBuf> {
        let file = self.locate(name, category);
        if !file.exists() {
            diagnostics.push(DataQualityIssue::MissingFile {
                file: file.display().to_string(),
            });
            return None;
        }

        let in_template_dir = file.parent() == Some(self.template_dir.as_path());
        if let (Some(output_dir), false) = (&self.output_dir, in_template_dir) {
            let file_name = match (display_name, file.extension()) {
                (Some(display), Some(ext)) => format!("{display}.{}", ext.to_string_lossy()),
                (Some(display), None) => display.to_string(),
                (None, _) => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            let copy_name = format!("{}_{}", self.report_number, file_name);
            match copy_into_dir(&file, &output_dir.join("others"), &copy_name) {
                Ok(copied) => debug!("copied {} to {}", file.display(), copied.display()),
                Err(e) => {
                    error!("failed to copy {}: {e}", file.display());
                    diagnostics.push(DataQualityIssue::CopyFailed {
                        file: file.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Some(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path(), &dir.path().join("templates"));
        let mut diagnostics = Diagnostics::new();

        let resolved =
            resolver.resolve_file("absent.png", FileCategory::Images, None, &mut diagnostics);

        assert!(resolved.is_none());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_resolved_image_is_copied_with_report_number() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images").join("front.jpg"), b"jpg").unwrap();
        let output = dir.path().join("out");
        let resolver = DirectoryResolver::new(dir.path(), &dir.path().join("templates"))
            .with_output(&output, "R2024-001");
        let mut diagnostics = Diagnostics::new();

        let resolved = resolver.resolve_file(
            " front.jpg ",
            FileCategory::Images,
            Some("正面"),
            &mut diagnostics,
        );

        assert_eq!(resolved, Some(dir.path().join("images").join("front.jpg")));
        assert!(output.join("others").join("R2024-001_正面.jpg").exists());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_template_images_are_not_copied() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("curve.png"), b"png").unwrap();
        let output = dir.path().join("out");
        let resolver = DirectoryResolver::new(dir.path(), &templates).with_output(&output, "R1");
        let mut diagnostics = Diagnostics::new();

        let resolved =
            resolver.resolve_file("curve.png", FileCategory::Template, None, &mut diagnostics);

        assert_eq!(resolved, Some(templates.join("curve.png")));
        assert!(!output.join("others").exists());
    }

    #[test]
    fn test_emit_image_defaults_name_to_stem() {
        let resolver = DirectoryResolver::new(Path::new("."), Path::new("templates"));
        let image = resolver.emit_image(Path::new("images/eye_diagram.png"), Some(130), None);
        assert_eq!(image.name, "eye_diagram");
        assert_eq!(image.width_mm, Some(130));
    }
}
