//! Report generation as a background unit of work.
//!
//! A task runs on its own thread and delivers exactly one [`TaskOutcome`]
//! over a channel. Callers either block on [`ReportTask::wait`] or poll
//! [`ReportTask::try_outcome`] from their own loop.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{error, info};

use crate::config::ReportConfig;
use crate::pipeline::{DocumentKind, GeneratedDocument, ReportError, ReportGenerator};

pub type TaskOutcome = Result<Vec<GeneratedDocument>, ReportError>;

/// Which documents a task builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskKind {
    Record,
    Report,
    /// The report first, then the record
    #[default]
    Both,
}

impl TaskKind {
    pub fn documents(self) -> &'static [DocumentKind] {
        match self {
            TaskKind::Record => &[DocumentKind::Record],
            TaskKind::Report => &[DocumentKind::Report],
            TaskKind::Both => &[DocumentKind::Report, DocumentKind::Record],
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(TaskKind::Record),
            "report" => Ok(TaskKind::Report),
            "both" => Ok(TaskKind::Both),
            other => Err(format!(
                "unknown task '{other}', expected record, report or both"
            )),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Record => "record",
            TaskKind::Report => "report",
            TaskKind::Both => "both",
        };
        f.write_str(name)
    }
}

/// Everything a task needs, owned so it can move to the worker thread.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub workbook: PathBuf,
    pub template_dir: PathBuf,
    pub kind: TaskKind,
    pub config: ReportConfig,
    /// Write contexts and error logs, and copy referenced files
    pub write_files: bool,
}

pub struct ReportTask {
    receiver: Receiver<TaskOutcome>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl ReportTask {
    /// Start the task on a named background thread.
    pub fn spawn(request: TaskRequest) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("report-task".to_string())
            .spawn(move || {
                let outcome = run(request);
                if sender.send(outcome).is_err() {
                    error!("report task finished after its receiver was dropped");
                }
            })?;
        Ok(ReportTask {
            receiver,
            handle: Some(handle),
            finished: false,
        })
    }

    /// Block until the task has finished.
    pub fn wait(mut self) -> TaskOutcome {
        let outcome = self.receiver.recv().unwrap_or(Err(ReportError::Aborted));
        self.join();
        outcome
    }

    /// The outcome, once available. Returns `None` while running and after
    /// the outcome has been taken.
    pub fn try_outcome(&mut self) -> Option<TaskOutcome> {
        if self.finished {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ReportError::Aborted),
        };
        self.finished = true;
        self.join();
        Some(outcome)
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!(critical = true, "report task panicked");
        }
    }
}

/// Build the requested documents in order, stopping at the first failure.
pub fn run(request: TaskRequest) -> TaskOutcome {
    let TaskRequest {
        workbook,
        template_dir,
        kind,
        config,
        write_files,
    } = request;

    let mut generator =
        ReportGenerator::open(&workbook, &template_dir, config)?.copy_files(write_files);

    let mut documents = Vec::new();
    for &document in kind.documents() {
        let generated = generator.generate(document)?;
        if write_files {
            generated.write_context()?;
        }
        documents.push(generated);
    }
    info!("task '{kind}' finished with {} documents", documents.len());
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_from_str() {
        assert_eq!("Report".parse::<TaskKind>(), Ok(TaskKind::Report));
        assert_eq!(" both ".parse::<TaskKind>(), Ok(TaskKind::Both));
        assert!("pdf".parse::<TaskKind>().is_err());
    }

    #[test]
    fn test_both_builds_report_first() {
        assert_eq!(
            TaskKind::Both.documents(),
            &[DocumentKind::Report, DocumentKind::Record]
        );
    }

    #[test]
    fn test_missing_workbook_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let task = ReportTask::spawn(TaskRequest {
            workbook: dir.path().join("absent.xlsm"),
            template_dir: dir.path().join("templates"),
            kind: TaskKind::Both,
            config: ReportConfig::default(),
            write_files: false,
        })
        .unwrap();

        assert!(matches!(task.wait(), Err(ReportError::Workbook { .. })));
    }
}
