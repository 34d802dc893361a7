//! artie-copy library - transcript inspection
//!
//! Replays captured `makemkvcon -r info` output through a [`RipSession`] and
//! renders what was learned about the disc as JSON. Kept separate from
//! `main.rs` so the CLI flow can be exercised by tests.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, info, warn};

use artie_common::config::{DriveConfig, ErrorPolicy};
use artie_common::events::{ProgressSink, RipEvent};
use artie_common::{DiscInfo, RipSession, SessionSummary};

/// Everything the CLI prints for one transcript
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub drive: DriveConfig,
    pub summary: SessionSummary,
    pub disc: DiscInfo,
}

/// Open the transcript at `path`, or stdin for `None` / `-`
pub fn open_transcript(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = File::open(p)
                .with_context(|| format!("Failed to open transcript {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Run one session over `reader`
pub fn inspect<R: BufRead, S: ProgressSink>(
    reader: R,
    drive: &DriveConfig,
    policy: ErrorPolicy,
    sink: S,
) -> Result<InspectReport> {
    info!(
        "Inspecting transcript for drive '{}' ({}), policy {:?}",
        drive.name, drive.serial_number, policy
    );

    let mut session = RipSession::new(policy, sink);
    session
        .feed_reader(reader)
        .context("Failed to process transcript")?;

    let (disc, summary) = session.finish();
    Ok(InspectReport {
        drive: drive.clone(),
        summary,
        disc,
    })
}

/// Serialize a report as JSON
pub fn render(report: &InspectReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

/// Drain `rx` into `sink` on a background thread
///
/// The thread ends once every sender of the bus is dropped and hands the
/// sink back.
pub fn spawn_event_writer<S>(mut rx: Receiver<RipEvent>, sink: S) -> JoinHandle<S>
where
    S: ProgressSink + Send + 'static,
{
    thread::spawn(move || {
        let mut written = 0u64;
        loop {
            match rx.blocking_recv() {
                Ok(event) => {
                    sink.publish(event);
                    written += 1;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Event writer fell behind, {} events dropped", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Event writer finished after {} events", written);
        sink
    })
}

/// Sink writing each event as one JSON line
///
/// Write failures are dropped; progress output is best effort.
pub struct JsonLinesSink<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> ProgressSink for JsonLinesSink<W> {
    fn publish(&self, event: RipEvent) {
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", line);
        }
    }
}
