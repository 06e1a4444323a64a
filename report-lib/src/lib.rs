#![allow(clippy::needless_return)]

pub mod aggregator;
pub mod assembler;
pub mod classifier;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod model;
pub mod naming;
pub mod numeric;
pub mod pipeline;
pub mod resources;
pub mod sections;
pub mod task;
pub mod utils;
pub mod verdict;
pub mod workbook;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use assembler::ReportAssembler;
pub use config::ReportConfig;
pub use diagnostics::{DataQualityIssue, Diagnostics};
pub use pipeline::{DocumentKind, GeneratedDocument, ReportError, ReportGenerator, build_items};
pub use task::{ReportTask, TaskKind, TaskOutcome, TaskRequest};

pub const ERRORS_LOG_FILE: &str = "errors.log";
