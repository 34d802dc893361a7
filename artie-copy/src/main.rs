//! artie-copy - MakeMKV transcript inspector
//!
//! Reads robot-mode output captured from `makemkvcon -r info` (a file, or
//! stdin), decodes it and prints the disc, title and stream information as
//! JSON on stdout. Logs go to stderr or the configured log file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use artie_common::config::{resolve_config_path, ErrorPolicy, LoggingConfig, TomlConfig};
use artie_common::events::{EventBus, NullSink};
use artie_copy::{inspect, open_transcript, render, spawn_event_writer, JsonLinesSink};

/// Command-line arguments for artie-copy
#[derive(Parser, Debug)]
#[command(name = "artie-copy")]
#[command(about = "Decode MakeMKV robot-mode output into disc information")]
#[command(version)]
struct Args {
    /// Transcript to read (stdin when omitted or "-")
    transcript: Option<PathBuf>,

    /// Config file (overrides ARTIE_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip lines that fail to decode or apply instead of aborting
    #[arg(long)]
    skip_errors: bool,

    /// Write progress events to stderr as JSON lines (buffered per
    /// `session.event_capacity`)
    #[arg(long)]
    events: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = match &config_path {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load configuration at {}", path.display()))?,
        None => TomlConfig::default(),
    };

    init_tracing(&config.logging)?;

    info!("Starting artie-copy v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => {
            info!("Config: {}", path.display());
            config.validate()?;
        }
        None => warn!("No config file found, using defaults"),
    }

    let policy = if args.skip_errors {
        ErrorPolicy::Skip
    } else {
        config.session.error_policy
    };

    let reader = open_transcript(args.transcript.as_deref())?;
    let report = if args.events {
        let bus = EventBus::new(config.session.event_capacity);
        let writer = spawn_event_writer(bus.subscribe(), JsonLinesSink::new(std::io::stderr()));
        let report = inspect(reader, &config.drive, policy, &bus);
        drop(bus);
        writer
            .join()
            .map_err(|_| anyhow!("Event writer thread panicked"))?;
        report?
    } else {
        inspect(reader, &config.drive, policy, NullSink)?
    };

    if report.summary.lines_skipped > 0 {
        warn!("{} lines were skipped", report.summary.lines_skipped);
    }

    println!("{}", render(&report, args.pretty)?);
    Ok(())
}

/// RUST_LOG wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
