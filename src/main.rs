//! Hostel CLI
//!
//! Command-line front-end over the hostel record store:
//! - File, list and inspect requests and complaints
//! - Move records through their statuses
//! - Export collections and show summaries

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use hostel_records::config::{generate_default_config, Config, LoggingConfig};
use hostel_records::report::{self, ExportFormat};
use hostel_records::storage::{BackendKind, HostelStore, NewRecord, RecordStore};
use hostel_records::workflow::{self, APPROVED, IN_PROGRESS, REJECTED, RESOLVED};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hostel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Request and complaint records for hostel management")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend: file, sqlite, memory (overrides config)
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Output format for listings (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: ExportFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Student requests
    Requests {
        #[command(subcommand)]
        action: RequestCommand,
    },

    /// Complaints
    Complaints {
        #[command(subcommand)]
        action: ComplaintCommand,
    },

    /// Show record counts per status
    Stats,

    /// Load sample records into empty collections
    Seed,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RequestCommand {
    /// List all requests
    List,
    /// Show one request
    Show { id: u64 },
    /// File a new request
    Add {
        /// Request type (Room Change, Maintenance, Guest Permission, ...)
        #[arg(long = "type", value_parser = non_empty)]
        kind: String,
        /// What is being asked for
        #[arg(short, long, value_parser = non_empty)]
        description: String,
        /// Student filing the request
        #[arg(short, long)]
        student: Option<String>,
        #[command(flatten)]
        extra: ExtraFields,
    },
    /// Set any status, bypassing the workflow
    Status { id: u64, status: String },
    /// Approve a pending request
    Approve {
        id: u64,
        #[arg(long)]
        force: bool,
    },
    /// Reject a pending request
    Reject {
        id: u64,
        #[arg(long)]
        force: bool,
    },
    /// Export all requests
    Export(ExportArgs),
}

#[derive(Subcommand)]
pub enum ComplaintCommand {
    /// List all complaints
    List,
    /// Show one complaint
    Show { id: u64 },
    /// File a new complaint
    Add {
        /// Student filing the complaint
        #[arg(short, long, value_parser = non_empty)]
        student: String,
        /// Complaint type (Noise, Cleanliness, Facilities, ...)
        #[arg(long = "type", value_parser = non_empty)]
        kind: String,
        /// Details
        #[arg(short, long)]
        description: Option<String>,
        /// Priority (default: Medium)
        #[arg(short, long)]
        priority: Option<String>,
        #[command(flatten)]
        extra: ExtraFields,
    },
    /// Set any status, bypassing the workflow
    Status { id: u64, status: String },
    /// Start investigating an open complaint
    Start {
        id: u64,
        #[arg(long)]
        force: bool,
    },
    /// Mark a complaint resolved
    Resolve {
        id: u64,
        #[arg(long)]
        force: bool,
    },
    /// Export all complaints
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ExtraFields {
    /// Extra fields in key=value format
    #[arg(short = 'F', long = "field")]
    fields: Vec<String>,
    /// Extra fields as a JSON object
    #[arg(long)]
    json: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Export format (csv, json)
    #[arg(long = "as", default_value = "csv")]
    export_as: ExportFormat,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }

    init_logging(&config.logging);

    if let Commands::Config { output } = &cli.command {
        return write_config(output.as_ref());
    }

    let storage_config = config.storage.to_storage_config();
    tracing::debug!("Data directory: {:?}", storage_config.data_dir);
    let store = HostelStore::open(&storage_config)
        .with_context(|| format!("opening store at {:?}", storage_config.data_dir))?;

    match cli.command {
        Commands::Requests { action } => run_requests(&store, action, cli.format),
        Commands::Complaints { action } => run_complaints(&store, action, cli.format),
        Commands::Stats => {
            let stats = store.stats();
            match cli.format {
                ExportFormat::Json => {
                    let body = serde_json::json!({
                        "backend": stats.backend,
                        "requests": summary_json(&stats.requests),
                        "complaints": summary_json(&stats.complaints),
                        "pending_requests": stats.pending_requests(),
                        "active_complaints": stats.active_complaints(),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                _ => {
                    println!("Hostel Records v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("Backend: {}", stats.backend);
                    println!("{}", stats.requests);
                    println!("{}", stats.complaints);
                    println!();
                    println!("Pending requests:  {}", stats.pending_requests());
                    println!("Active complaints: {}", stats.active_complaints());
                }
            }
            Ok(())
        }
        Commands::Seed => {
            let added = store.seed_demo()?;
            if added == 0 {
                println!("Collections already hold records, nothing seeded.");
            } else {
                println!("Seeded {} records.", added);
            }
            Ok(())
        }
        Commands::Config { .. } => unreachable!("handled before opening the store"),
    }
}

fn run_requests(
    store: &HostelStore,
    action: RequestCommand,
    format: ExportFormat,
) -> anyhow::Result<()> {
    let requests = store.requests();

    match action {
        RequestCommand::List => print_records(requests, format),
        RequestCommand::Show { id } => show(requests, id, format),
        RequestCommand::Add {
            kind,
            description,
            student,
            extra,
        } => {
            let mut new = extra.into_new_record()?;
            new = new.field("type", kind).field("description", description);
            if let Some(student) = student {
                new = new.field("student", student);
            }
            added(requests, new, format)
        }
        RequestCommand::Status { id, status } => set_status(requests, id, &status, true),
        RequestCommand::Approve { id, force } => set_status(requests, id, APPROVED, force),
        RequestCommand::Reject { id, force } => set_status(requests, id, REJECTED, force),
        RequestCommand::Export(args) => export(requests, args),
    }
}

fn run_complaints(
    store: &HostelStore,
    action: ComplaintCommand,
    format: ExportFormat,
) -> anyhow::Result<()> {
    let complaints = store.complaints();

    match action {
        ComplaintCommand::List => print_records(complaints, format),
        ComplaintCommand::Show { id } => show(complaints, id, format),
        ComplaintCommand::Add {
            student,
            kind,
            description,
            priority,
            extra,
        } => {
            let mut new = extra.into_new_record()?;
            new = new.field("student", student).field("type", kind);
            if let Some(description) = description {
                new = new.field("description", description);
            }
            if let Some(priority) = priority {
                new = new.field("priority", priority);
            }
            added(complaints, new, format)
        }
        ComplaintCommand::Status { id, status } => set_status(complaints, id, &status, true),
        ComplaintCommand::Start { id, force } => set_status(complaints, id, IN_PROGRESS, force),
        ComplaintCommand::Resolve { id, force } => set_status(complaints, id, RESOLVED, force),
        ComplaintCommand::Export(args) => export(complaints, args),
    }
}

impl ExtraFields {
    fn into_new_record(self) -> anyhow::Result<NewRecord> {
        let mut new = match self.json.as_deref() {
            Some(text) => NewRecord::from_json(text).context("parsing --json")?,
            None => NewRecord::new(),
        };

        for field in self.fields {
            match field.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    new = new.field(key.trim(), value);
                }
                _ => bail!("invalid field '{}', expected key=value", field),
            }
        }

        Ok(new)
    }
}

fn print_records(store: &RecordStore, format: ExportFormat) -> anyhow::Result<()> {
    let records = store.list();
    match format {
        ExportFormat::Table => print!("{}", report::render_table(&records)),
        other => println!("{}", report::export(&records, other)?.trim_end()),
    }
    Ok(())
}

fn show(store: &RecordStore, id: u64, format: ExportFormat) -> anyhow::Result<()> {
    let Some(record) = store.get(id) else {
        bail!("no {} record with id {}", store.kind(), id);
    };

    match format {
        ExportFormat::Table => {
            println!("ID:     {}", record.id);
            println!("Status: {}", record.status);
            println!("Date:   {}", record.date);
            for (key, value) in record.fields() {
                match value.as_str() {
                    Some(s) => println!("{:<7} {}", format!("{}:", key), s),
                    None => println!("{:<7} {}", format!("{}:", key), value),
                }
            }
            println!();
            if workflow::is_terminal(store.kind(), &record.status) {
                println!("No further status changes offered.");
            } else {
                let next = workflow::next_statuses(store.kind(), &record.status);
                println!("Next: {}", next.join(", "));
            }
        }
        ExportFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        ExportFormat::Csv => print!(
            "{}",
            report::export(std::slice::from_ref(&record), ExportFormat::Csv)?
        ),
    }
    Ok(())
}

fn added(store: &RecordStore, new: NewRecord, format: ExportFormat) -> anyhow::Result<()> {
    let record = store.add(new)?;
    match format {
        ExportFormat::Table => println!(
            "Added {} #{} ({}, {})",
            store.kind(),
            record.id,
            record.status,
            record.date
        ),
        ExportFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        ExportFormat::Csv => print!(
            "{}",
            report::export(std::slice::from_ref(&record), ExportFormat::Csv)?
        ),
    }
    Ok(())
}

fn set_status(store: &RecordStore, id: u64, status: &str, force: bool) -> anyhow::Result<()> {
    let Some(record) = store.get(id) else {
        bail!("no {} record with id {}", store.kind(), id);
    };

    if !force {
        if let Err(e) = workflow::check_transition(store.kind(), &record.status, status) {
            bail!("{} (use --force to override)", e);
        }
    }

    store.update_status(id, status)?;
    println!("{} #{}: {} -> {}", store.kind(), id, record.status, status);
    Ok(())
}

fn export(store: &RecordStore, args: ExportArgs) -> anyhow::Result<()> {
    if args.export_as == ExportFormat::Table {
        bail!("export supports csv or json");
    }

    let records = store.list();
    let data = report::export(&records, args.export_as)?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &data)?;
            println!("Exported {} {} to {:?}", records.len(), store.kind(), path);
        }
        None => print!("{}", data),
    }
    Ok(())
}

fn write_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", config),
    }
    Ok(())
}

fn summary_json(summary: &hostel_records::CollectionSummary) -> serde_json::Value {
    let by_status: serde_json::Map<String, serde_json::Value> = summary
        .by_status
        .iter()
        .map(|(status, n)| (status.clone(), serde_json::Value::from(*n)))
        .collect();

    serde_json::json!({
        "total": summary.total,
        "by_status": by_status,
    })
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("hostel_records={0},hostel={0}", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn non_empty(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}
