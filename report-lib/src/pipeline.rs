use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::aggregator::aggregate;
use crate::assembler::ReportAssembler;
use crate::classifier::classify;
use crate::config::ReportConfig;
use crate::context::{ReportContext, ReportSummary};
use crate::diagnostics::Diagnostics;
use crate::model::{ClassifiedItem, Part, RawRow};
use crate::naming::OutputPaths;
use crate::resources::{DirectoryResolver, FileResolver};
use crate::sections;
use crate::verdict::VerdictResolver;
use crate::workbook::{SheetSource, XlsxWorkbook};
use crate::ERRORS_LOG_FILE;

/// Failures that stop the generation of a document.
///
/// Data quality problems never end up here, they are collected in
/// [`Diagnostics`] instead.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("sheet '{0}' is missing or has no data")]
    MissingSheet(String),

    #[error("'{field}' in sheet '{sheet}' has not been filled in")]
    UnfilledField { sheet: String, field: String },

    #[error("report task stopped before delivering a result")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize the report context: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

/// The two documents built from one workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentKind {
    /// Raw test record
    Record,
    /// Formal test report with conclusion, TOC and not-applicable summary
    Report,
}

impl DocumentKind {
    /// Short label used in output file names.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Record => "记录",
            DocumentKind::Report => "报告",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Record => "原始记录",
            DocumentKind::Report => "检验报告",
        }
    }
}

/// Classify, resolve verdicts and aggregate the rows of the results sheet.
pub fn build_items(
    rows: Vec<RawRow>,
    config: &ReportConfig,
    resolver: &dyn FileResolver,
    diagnostics: &mut Diagnostics,
) -> Vec<ClassifiedItem> {
    let items = classify(rows, config, diagnostics);
    let items = VerdictResolver::new(config, resolver).resolve(items, diagnostics);
    aggregate(items)
}

/// A finished rendering context together with where it belongs.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub paths: OutputPaths,
    pub context: ReportContext,
    pub diagnostics: Diagnostics,
}

impl GeneratedDocument {
    /// Write the context as `<stem>.json` and append the diagnostics to the error log.
    pub fn write_context(&self) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.paths.dir)?;
        let context_file = self.paths.context_file();
        let json = serde_json::to_string_pretty(&self.context.to_value()?)?;
        fs::write(&context_file, json)?;
        self.diagnostics
            .write_to_log(&self.paths.dir.join(ERRORS_LOG_FILE), self.kind.title())?;
        info!("context written to {}", context_file.display());
        Ok(context_file)
    }
}

/// Builds the documents of one workbook.
pub struct ReportGenerator<S: SheetSource> {
    source: S,
    workbook_dir: PathBuf,
    template_dir: PathBuf,
    config: ReportConfig,
    copy_files: bool,
}

impl ReportGenerator<XlsxWorkbook> {
    pub fn open(
        workbook: &Path,
        template_dir: &Path,
        config: ReportConfig,
    ) -> Result<Self, ReportError> {
        let source = XlsxWorkbook::open(workbook)?;
        let workbook_dir = workbook.parent().unwrap_or(Path::new("."));
        Ok(ReportGenerator::new(source, workbook_dir, template_dir, config))
    }
}

impl<S: SheetSource> ReportGenerator<S> {
    pub fn new(source: S, workbook_dir: &Path, template_dir: &Path, config: ReportConfig) -> Self {
        ReportGenerator {
            source,
            workbook_dir: workbook_dir.to_path_buf(),
            template_dir: template_dir.to_path_buf(),
            config,
            copy_files: true,
        }
    }

    /// Copy referenced files into the output folder while generating.
    pub fn copy_files(mut self, copy_files: bool) -> Self {
        self.copy_files = copy_files;
        self
    }

    pub fn generate(&mut self, kind: DocumentKind) -> Result<GeneratedDocument, ReportError> {
        info!("generating {}", kind.title());
        self.build(kind).inspect_err(|e| {
            error!(critical = true, "generating {} failed: {e}", kind.title());
        })
    }

    fn build(&mut self, kind: DocumentKind) -> Result<GeneratedDocument, ReportError> {
        let config = &self.config;
        let mut diagnostics = Diagnostics::new();

        info!("reading the basic task information");
        let task_info = sections::read_task_info(&mut self.source, config, &mut diagnostics)?;
        let paths = OutputPaths::new(&self.workbook_dir, &task_info, kind, config)?;

        let mut resolver = DirectoryResolver::new(&self.workbook_dir, &self.template_dir);
        if self.copy_files {
            resolver = resolver.with_output(&paths.dir, &paths.report_number);
        }

        let equipment_images = sections::read_equipment_photos(
            &mut self.source,
            config,
            kind,
            &resolver,
            &mut diagnostics,
        )?;

        info!("reading the test criteria");
        let criteria = sections::read_criteria(&mut self.source, config, kind)?;

        info!("building the result table");
        let rows = sections::read_result_rows(&mut self.source, config)?;
        let items = build_items(rows, config, &resolver, &mut diagnostics);
        let assembler = ReportAssembler::new(&items, config);
        let tbl_result = assembler.result_table();

        let summary = match kind {
            DocumentKind::Report => {
                info!("building the conclusion, TOC and not-applicable summary");
                Some(ReportSummary {
                    conclusion1: assembler.conclusion(Part::One),
                    conclusion2: assembler.conclusion(Part::Two),
                    tbl_toc: assembler.toc(),
                    tbl_not_support: assembler.not_support(),
                })
            }
            DocumentKind::Record => None,
        };

        info!("reading testers, instruments and attachments");
        let tbl_tester = sections::read_testers(&mut self.source, config)?;
        let tbl_instrument = sections::read_instruments(&mut self.source, config, &mut diagnostics)?;
        let attachment_images = sections::read_attachment_images(
            &mut self.source,
            config,
            kind,
            &resolver,
            &mut diagnostics,
        )?;

        let context = ReportContext {
            info: task_info,
            equipment_images,
            criteria,
            tbl_result,
            summary,
            tbl_tester,
            tbl_instrument,
            attachment_images,
        };

        if diagnostics.is_empty() {
            info!("{} is ready", kind.title());
        } else {
            info!(
                "{} is ready with {} data quality issues",
                kind.title(),
                diagnostics.len()
            );
        }

        Ok(GeneratedDocument {
            kind,
            paths,
            context,
            diagnostics,
        })
    }
}
