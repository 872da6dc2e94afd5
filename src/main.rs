#![forbid(unsafe_code)]

//! `registrar-notify`: bulk SMS notifications for the registrar's office.
//!
//! Reads pre-joined record rows from a JSON file, notifies each student once
//! through the SMS gateway and prints a JSON report whose
//! `messaged_record_ids` the caller marks as messaged in the record store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use registrar_notify::audit::JsonlAuditWriter;
use registrar_notify::config::GlobalConfig;
use registrar_notify::gateway::SmsChefGateway;
use registrar_notify::models::grade::GradeRow;
use registrar_notify::models::remark::{infer_remark, parse_grade, Remark};
use registrar_notify::models::request::DocumentRow;
use registrar_notify::notify::{self, DispatchReport, Dispatcher};
use registrar_notify::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Grade remarks that trigger a notification.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum NotifiableRemark {
    Failed,
    Incomplete,
}

impl From<NotifiableRemark> for Remark {
    fn from(remark: NotifiableRemark) -> Self {
        match remark {
            NotifiableRemark::Failed => Self::Failed,
            NotifiableRemark::Incomplete => Self::Incomplete,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "registrar-notify", about = "Registrar SMS notifications", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Notify students with failed or incomplete grades.
    Grades {
        /// Which remark to notify about.
        #[arg(long, value_enum)]
        remark: NotifiableRemark,
        /// JSON array of grade rows joined with `student_info` and `subjects`.
        #[arg(long)]
        input: PathBuf,
        /// Render and normalize without sending.
        #[arg(long)]
        dry_run: bool,
    },

    /// Notify students whose requested documents are ready for pickup.
    Documents {
        /// JSON array of request rows joined with `student_info` and `document_type`.
        #[arg(long)]
        input: PathBuf,
        /// Render and normalize without sending.
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a grade entry and print its remark.
    Remark {
        /// Grade as typed into the entry form; empty means ungraded.
        #[arg(allow_hyphen_values = true, default_value = "")]
        grade: String,
    },
}

/// JSON document printed after a dispatch run.
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    #[serde(flatten)]
    report: &'a DispatchReport,
    messaged_record_ids: Vec<i64>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    info!("configuration loaded");

    match args.command {
        Command::Grades {
            remark,
            input,
            dry_run,
        } => {
            let rows: Vec<GradeRow> = read_rows(&input)?;
            info!(rows = rows.len(), "grade rows loaded");
            let dispatcher = build_dispatcher(&mut config, dry_run).await?;
            let report = notify::notify_grades(&dispatcher, &config, &rows, remark.into()).await?;
            print_report(&report)
        }
        Command::Documents { input, dry_run } => {
            let rows: Vec<DocumentRow> = read_rows(&input)?;
            info!(rows = rows.len(), "document rows loaded");
            let dispatcher = build_dispatcher(&mut config, dry_run).await?;
            let report = notify::notify_documents(&dispatcher, &config, &rows).await?;
            print_report(&report)
        }
        Command::Remark { grade } => {
            let grade = parse_grade(&grade)?;
            let remark = infer_remark(grade);
            print_json(&serde_json::json!({
                "grade": grade,
                "remark": remark,
                "remark_id": remark.id(),
            }))
        }
    }
}

async fn build_dispatcher(config: &mut GlobalConfig, dry_run: bool) -> Result<Dispatcher> {
    let dispatcher = if dry_run {
        info!("dry run: messages will not be sent");
        Dispatcher::dry_run(config.phone_normalizer())
    } else {
        config.load_credentials().await?;
        let gateway = SmsChefGateway::new(&config.gateway)?;
        Dispatcher::new(Arc::new(gateway), config.phone_normalizer())
    };

    match &config.audit_dir {
        Some(dir) => {
            let writer = JsonlAuditWriter::new(dir.clone())?;
            info!(dir = %dir.display(), "dispatch audit enabled");
            Ok(dispatcher.with_audit(Arc::new(writer)))
        }
        None => Ok(dispatcher),
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| AppError::Io(format!("cannot read {}: {err}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|err| AppError::Parse(format!("invalid rows in {}: {err}", path.display())))
}

fn print_report(report: &DispatchReport) -> Result<()> {
    print_json(&RunOutput {
        report,
        messaged_record_ids: report.messaged_record_ids(),
    })
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
