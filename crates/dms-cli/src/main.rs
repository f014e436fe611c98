//! dms: command-line access to template-driven document indexing and search.
//!
//! Works against a JSON fixture file (`--data`) or a PostgreSQL database
//! (`--database-url` / `DATABASE_URL`).

mod backend;
mod commands;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dms_core::defaults::REPORT_FIELD;
use dms_core::{DmsConfig, DocumentStore, Error};
use dms_forms::FormMode;

use backend::Backend;
use commands::{parse_key_value, submission, OutputFormat, Target};

#[derive(Parser)]
#[command(name = "dms")]
#[command(author, version, about = "Template-driven document indexing and search")]
#[command(propagate_version = true)]
struct Cli {
    /// JSON fixture file holding templates and documents
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// PostgreSQL connection string, used when no fixture file is given
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the form fields of a document type or template
    #[command(group(ArgGroup::new("target").required(true).args(["docrule", "mdt"])))]
    Fields {
        /// Document type id
        #[arg(short, long)]
        docrule: Option<String>,

        /// Single metadata template id (always search layout)
        #[arg(short, long)]
        mdt: Option<String>,

        /// Render the search layout (date fields become From/To pairs)
        #[arg(short, long)]
        search: bool,
    },

    /// Search documents by index values
    #[command(group(ArgGroup::new("target").required(true).args(["docrule", "mdt"])))]
    Search {
        #[arg(short, long)]
        docrule: Option<String>,

        #[arg(short, long)]
        mdt: Option<String>,

        /// Field values by form key, e.g. -k 0=JTG -k 2_from=01/03/2012
        #[arg(short = 'k', long = "key", value_parser = parse_key_value)]
        keys: Vec<(String, String)>,

        /// Creation date lower bound
        #[arg(long)]
        from: Option<String>,

        /// Creation date upper bound
        #[arg(long)]
        to: Option<String>,

        /// Allow a search with no criteria (returns every document)
        #[arg(long)]
        confirm_all: bool,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Suggest values for a partially typed field
    Suggest {
        #[arg(short, long)]
        docrule: String,

        /// Field label
        #[arg(short, long)]
        field: String,

        /// Typed prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Index (or reindex) a document
    Index {
        #[arg(short, long)]
        docrule: String,

        /// Document code
        #[arg(short, long)]
        code: String,

        #[arg(short = 'k', long = "key", value_parser = parse_key_value)]
        keys: Vec<(String, String)>,

        /// Creation date (defaults to today)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Report code, revisions and one index value for every document
    Report {
        /// Index field to report
        #[arg(short, long, default_value = REPORT_FIELD)]
        field: String,

        /// Quoted comma separated output
        #[arg(long)]
        parsable: bool,
    },

    /// Apply database migrations
    Migrate,
}

fn target(docrule: Option<String>, mdt: Option<String>) -> anyhow::Result<Target> {
    match (docrule, mdt) {
        (_, Some(mdt_id)) => Ok(Target::Template(mdt_id)),
        (Some(docrule_id), None) => Ok(Target::Docrule(docrule_id)),
        (None, None) => anyhow::bail!("one of --docrule or --mdt is required"),
    }
}

/// Initialize tracing to stderr or `LOG_FILE`.
///
/// Environment variables:
///   LOG_FORMAT - "json" or "text" (default: "text")
///   LOG_FILE   - path to log file (optional, daily rotation)
///   LOG_ANSI   - "true"/"false" override ANSI colors
///   RUST_LOG   - standard env filter (default: "dms=info,dms_search=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dms=info,dms_search=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("dms.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // stdout carries command output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) if err.is_user_warning() => {
                eprintln!("Warning: {}", err);
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = DmsConfig::from_env();
    let backend = Backend::open(cli.data.as_deref(), cli.database_url.as_deref(), &config).await?;
    let svc = backend.service(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Fields {
            docrule,
            mdt,
            search,
        } => {
            let mode = if search { FormMode::Search } else { FormMode::Index };
            commands::fields(&svc, &target(docrule, mdt)?, mode, &mut out).await?;
        }
        Commands::Search {
            docrule,
            mdt,
            keys,
            from,
            to,
            confirm_all,
            format,
        } => {
            let submitted = submission(keys, from, to, None);
            commands::search(
                &svc,
                &target(docrule, mdt)?,
                &submitted,
                confirm_all,
                format,
                &mut out,
            )
            .await?;
        }
        Commands::Suggest {
            docrule,
            field,
            prefix,
        } => {
            commands::suggest(&svc, &docrule, &field, &prefix, &mut out).await?;
        }
        Commands::Index {
            docrule,
            code,
            keys,
            date,
            description,
        } => {
            let submitted = submission(keys, date, None, description);
            let today = chrono::Local::now().date_naive();
            commands::index(&svc, &docrule, &code, &submitted, today, &mut out).await?;
            backend.persist().await?;
        }
        Commands::Report { field, parsable } => {
            let documents = svc.documents().list_documents().await?;
            commands::report(&documents, &field, parsable, &mut out)?;
        }
        Commands::Migrate => {
            backend.migrate().await?;
            writeln!(out, "Migrations applied")?;
        }
    }

    out.flush()?;
    Ok(())
}
