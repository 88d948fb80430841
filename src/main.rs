use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use tablegate::model::{ProjectDraft, SourceFile};
use tablegate::notify::Severity;
use tablegate::pipeline::UploadConfig;
use tablegate::remote::memory::MemoryBackend;
use tablegate::remote::StaticIdentity;
use tablegate::rules::RuleRegistry;
use tablegate::services::{validate_draft, RuleCatalog};
use tablegate::EditorSession;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a project definition against the built-in rule catalog
    Validate {
        /// Path to a project definition (JSON)
        #[clap(short, long)]
        project: PathBuf,
    },
    /// Create a project and ingest a CSV file against the in-memory backend
    Ingest {
        /// Path to a project definition (JSON)
        #[clap(short, long)]
        project: PathBuf,
        /// Path to the CSV dataset
        #[clap(short, long)]
        csv: PathBuf,
    },
    /// List the validation rules this installation knows about
    Rules,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Validate { project } => validate_command(project),
        Commands::Ingest { project, csv } => ingest_command(project, csv).await,
        Commands::Rules => {
            for spec in RuleRegistry::builtin().specs() {
                println!("{:<20} {}", spec.name, spec.description);
            }
            Ok(())
        }
    }
}

fn read_project(path: &PathBuf) -> Result<ProjectDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let draft: ProjectDraft = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid project definition", path.display()))?;
    Ok(draft)
}

fn validate_command(path: PathBuf) -> Result<()> {
    let draft = read_project(&path)?;
    let catalog = RuleCatalog::new(RuleRegistry::builtin().names());

    let issues = validate_draft(&draft, &catalog);
    if issues.is_empty() {
        println!("OK: {} schema fields, {} rules", draft.schema.len(), draft.rules.len());
        return Ok(());
    }
    for issue in &issues {
        println!("{issue}");
    }
    anyhow::bail!("{} issue(s) found", issues.len())
}

async fn ingest_command(project_path: PathBuf, csv_path: PathBuf) -> Result<()> {
    let draft = read_project(&project_path)?;
    let bytes = std::fs::read(&csv_path)
        .with_context(|| format!("failed to read {}", csv_path.display()))?;
    let file_name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset.csv".to_string());

    let identity = Arc::new(StaticIdentity::new(whoami(), "local-token"));
    let backend = Arc::new(MemoryBackend::new(identity.clone()));
    let mut session = EditorSession::with_upload_config(
        backend,
        identity,
        UploadConfig::new(std::time::Duration::from_millis(50), 20),
    );

    session.refresh_catalog().await;
    session.begin_new_project();
    *session.project_mut().expect("fresh draft") = draft;
    session.attach_file(SourceFile::csv(file_name, bytes)).ok();

    let created = session.create().await;

    for notice in session.drain_notices() {
        let tag = match notice.severity {
            Severity::Success => "ok",
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        println!("[{tag}] {}: {}", notice.summary, notice.detail);
    }
    for row_error in session.ingest_errors() {
        println!(
            "  row {} field {} value {}: {}",
            row_error.row, row_error.field, row_error.value, row_error.message
        );
    }

    match created {
        Some(id) => {
            info!(project_id = id, "ingestion finished");
            Ok(())
        }
        None => anyhow::bail!("ingestion did not complete"),
    }
}

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "local".to_string())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tablegate={log_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
