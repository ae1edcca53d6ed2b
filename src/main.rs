#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

use mathlab::app::config::{project_dirs, HubConfig};
use mathlab::app::data_hub::{
    in_handler, Category, ComplexValue, DataHub, Dataset, EntryId, EntrySummary, ExportMetadata,
    Payload,
};
use mathlab::app::notifications::NotificationManager;

#[derive(Parser)]
#[command(name = "mathlab")]
#[command(about = "Inspect and manage the Math Lab shared data hub")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")"))]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot file, overriding the configured one
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Do not write the snapshot back after a mutating command
    #[arg(long, global = true)]
    no_save: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Entry count per category
    Counts,
    /// List entries, newest first, or one category in export order
    List {
        #[arg(long, short)]
        category: Option<String>,
    },
    /// Find entries by name
    Search { text: String },
    /// Print one entry as JSON
    Show { category: String, id: String },
    /// Remove one entry
    Remove { category: String, id: String },
    /// Remove every entry, or every entry of one category
    Clear {
        #[arg(long, short)]
        category: Option<String>,
    },
    /// Export a sample session from several tabs
    Demo,
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::Remove { .. } | Commands::Clear { .. } | Commands::Demo
        )
    }
}

fn init_logging(default_filter: &str) {
    let Some(proj_dirs) = project_dirs() else {
        eprintln!("No home directory found, logging disabled");
        return;
    };
    let log_dir = proj_dirs.data_dir().join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_path = log_dir.join("mathlab.log");

    let file = match std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return;
        }
    };

    // RUST_LOG wins over the configured filter
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mathlab=info"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false), // No ANSI colors in file
    );

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    // Bridge log crate events from dependencies into tracing
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize log-to-tracing bridge: {}", e);
    }

    tracing::info!("Logging initialized to: {:?}", log_path);
}

fn setup_panic_handler() {
    // Write panics to a crash log even before logging is initialized
    std::panic::set_hook(Box::new(|panic_info| {
        // Handler panics are caught and logged by the event bus
        if in_handler() {
            return;
        }

        let crash_msg = format!(
            "Math Lab crashed!\n\
             Panic occurred at: {}\n\
             Details: {}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
        );

        if let Some(proj_dirs) = project_dirs() {
            let log_dir = proj_dirs.data_dir().join("logs");
            let _ = std::fs::create_dir_all(&log_dir);
            let crash_log_path = log_dir.join("crash.log");

            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                use std::io::Write;
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
            }
            eprintln!("\n{}", crash_msg);
            eprintln!("Crash log written to: {:?}", crash_log_path);
        } else {
            eprintln!("\n{}", crash_msg);
        }
    }));
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HubConfig> {
    match path.map(Path::to_path_buf).or_else(HubConfig::default_path) {
        Some(path) => HubConfig::load_or_default(&path),
        None => Ok(HubConfig::default()),
    }
}

fn print_summaries(summaries: &[EntrySummary]) {
    if summaries.is_empty() {
        println!("(no entries)");
        return;
    }
    for summary in summaries {
        let dims = summary
            .dimensions
            .map(|(rows, cols)| format!("{}x{}", rows, cols))
            .unwrap_or_default();
        println!(
            "{:<10} {:<24} {:<6} {:<12} {}  {}",
            summary.category,
            summary.name,
            dims,
            summary.source_tab,
            summary.timestamp.format("%Y-%m-%d %H:%M:%S"),
            summary.id
        );
    }
}

/// Exports what a short session across the lab tabs would produce
fn run_demo(hub: &DataHub, notifications: &mut NotificationManager) {
    let exports = [
        (
            "matrices",
            Category::Matrices,
            Payload::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
            Some(ExportMetadata::named("Matrix A")),
        ),
        (
            "quantum",
            Category::Matrices,
            Payload::Matrix(vec![
                vec![std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2],
                vec![std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2],
            ]),
            Some(ExportMetadata::named("Hadamard").with_field("qubits", 1)),
        ),
        (
            "complex",
            Category::Complex,
            Payload::Complex(ComplexValue::new(0.0, 1.0)),
            Some(ExportMetadata::named("i")),
        ),
        (
            "calculus",
            Category::Functions,
            Payload::Function("sin(x) * exp(-x / 4)".to_string()),
            Some(ExportMetadata::named("Damped sine")),
        ),
        (
            "statistics",
            Category::Arrays,
            Payload::Array(vec![2.1, 2.4, 1.9, 2.8, 2.2]),
            None,
        ),
        (
            "statistics",
            Category::Scalars,
            Payload::Scalar(2.28),
            Some(ExportMetadata::named("Sample mean")),
        ),
        (
            "neural",
            Category::Datasets,
            Payload::Dataset(Dataset::new(
                vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
                vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
            )),
            Some(ExportMetadata::named("XOR")),
        ),
    ];

    for (source_tab, category, payload, metadata) in exports {
        if let Some(id) = notifications.report(
            hub.export(source_tab, category, payload, metadata),
            source_tab,
        ) {
            println!("{} exported {} {}", source_tab, category.singular(), id);
        }
    }
}

fn run_command(
    command: &Commands,
    hub: &DataHub,
    notifications: &mut NotificationManager,
) -> anyhow::Result<()> {
    match command {
        Commands::Counts => {
            let counts = hub.counts();
            for category in Category::ALL {
                println!("{:<10} {}", category, counts.get(category));
            }
            println!("{:<10} {}", "total", counts.total);
        }
        Commands::List { category: None } => print_summaries(&hub.list_all()),
        Commands::List {
            category: Some(category),
        } => {
            if let Some(summaries) = notifications.report(hub.list(category), "cli") {
                print_summaries(&summaries);
            }
        }
        Commands::Search { text } => print_summaries(&hub.search(text)),
        Commands::Show { category, id } => {
            match notifications.report(hub.get_entry(category, &EntryId::from(id.as_str())), "cli")
            {
                Some(Some(entry)) => println!("{}", serde_json::to_string_pretty(&entry)?),
                Some(None) => println!("No entry {} in {}", id, category),
                None => {}
            }
        }
        Commands::Remove { category, id } => {
            match notifications.report(hub.remove(category, &EntryId::from(id.as_str())), "cli") {
                Some(true) => println!("Removed {}", id),
                Some(false) => println!("No entry {} in {}", id, category),
                None => {}
            }
        }
        Commands::Clear { category: None } => hub.clear_all(),
        Commands::Clear {
            category: Some(category),
        } => {
            notifications.report(hub.clear(category), "cli");
        }
        Commands::Demo => run_demo(hub, notifications),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    setup_panic_handler();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log_filter);

    tracing::info!(
        "mathlab starting ({}@{})",
        env!("GIT_BRANCH"),
        env!("GIT_COMMIT")
    );

    let snapshot_path = cli
        .snapshot
        .clone()
        .or_else(|| config.resolved_snapshot_path());

    let hub = DataHub::new();
    if let Some(path) = snapshot_path.as_deref() {
        if config.restore_on_start && path.exists() {
            let restored = hub
                .load_from_path(path)
                .with_context(|| format!("Could not restore hub from {}", path.display()))?;
            tracing::info!("Restored {} entries from {:?}", restored, path);
        }
    }

    let mut notifications = NotificationManager::new();
    run_command(&cli.command, &hub, &mut notifications)?;

    for notification in notifications.get_active_notifications() {
        eprintln!("{} {}", notification.get_icon(), notification.message());
        for error in &notification.errors {
            if let Some(details) = &error.details {
                eprintln!("  {}", details);
            }
        }
    }

    if cli.command.mutates() && config.save_on_exit && !cli.no_save {
        if let Some(path) = snapshot_path.as_deref() {
            if let Err(e) = hub.save_to_path(path) {
                mathlab::log_error!("Failed to save hub snapshot: {:#}", e);
                return Err(e);
            }
        }
    }

    if notifications.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
