// reset; cargo run -- ./data/原始记录.xlsm --task both -v
// reset; cargo run -- ./data/原始记录.xlsm --task report --config report.toml --dry-run

use anyhow::Context;
use clap::Parser;
use report_lib::{ERRORS_LOG_FILE, ReportConfig, ReportTask, TaskKind, TaskRequest};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "test-report")]
#[command(about = "Builds the rendering context of test reports and records from a test workbook")]
#[command(version)]
struct Args {
    /// Path to the test workbook (.xlsx/.xlsm)
    workbook: PathBuf,

    /// Documents to build: record, report or both (report first)
    #[arg(short, long, default_value_t = TaskKind::Both)]
    task: TaskKind,

    /// Optional TOML file overriding markers, labels and sheet names
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding the document templates and their images
    #[arg(long, default_value = "templates")]
    templates: PathBuf,

    /// Print the contexts instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> anyhow::Result<()> {
    let arguments = Args::parse();
    setup_logging(arguments.verbose);

    let config = match &arguments.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    let task = ReportTask::spawn(TaskRequest {
        workbook: arguments.workbook.clone(),
        template_dir: arguments.templates.clone(),
        kind: arguments.task,
        config,
        write_files: !arguments.dry_run,
    })
    .context("Failed to start the report task")?;

    match task.wait() {
        Ok(documents) => {
            for document in &documents {
                let title = document.kind.title();
                if arguments.dry_run {
                    let context = document.context.to_value()?;
                    println!("{}", serde_json::to_string_pretty(&context)?);
                } else {
                    println!("✅ {title} written: {}", document.paths.context_file().display());
                }
                if !document.diagnostics.is_empty() {
                    println!(
                        "❌ {title} has {} data quality issues",
                        document.diagnostics.len()
                    );
                    if !arguments.dry_run {
                        eprintln!(
                            "❌ Check {} for details.",
                            document.paths.dir.join(ERRORS_LOG_FILE).display()
                        );
                    }
                }
            }
            println!("✅ Task '{}' completed!", arguments.task);
        }
        Err(e) => {
            eprintln!("❌ Task '{}' failed with error: {e}", arguments.task);
            std::process::exit(1);
        }
    }

    Ok(())
}
