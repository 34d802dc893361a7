//! Rip session: routes decoded lines to the disc tree or the progress sink
//!
//! A session consumes lines that something else already captured from
//! MakeMKV (a live pipe, a transcript file, a test fixture). It owns exactly
//! one [`DiscInfoAggregator`]; sessions for different drives share nothing.
//!
//! The expected, but unenforced, shape of an `info` run is: `DRV` lines, disc
//! attributes, `TCOUNT`, title and stream attributes interleaved with
//! progress lines, then a closing `MSG`.

use serde::Serialize;
use std::io::BufRead;
use tracing::{debug, error, info, warn};

use crate::config::ErrorPolicy;
use crate::events::{ProgressSink, RipEvent};
use crate::makemkv::{
    decode, DecodeError, DiscInfo, DiscInfoAggregator, GeneralMessage, Message,
};
use crate::{Error, Result};

/// What happened to a single fed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Empty or whitespace-only line
    Blank,
    /// Message folded into the disc information tree
    Applied,
    /// Message published to the progress sink
    Published,
    /// Line rejected and skipped under [`ErrorPolicy::Skip`]
    Skipped,
}

/// Counters describing a session so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub lines_read: usize,
    pub messages_applied: usize,
    pub events_published: usize,
    pub lines_skipped: usize,
    /// Most recent `MSG` line; MakeMKV closes a run with one
    pub last_message: Option<GeneralMessage>,
}

/// One rip attempt for one disc
pub struct RipSession<S: ProgressSink> {
    policy: ErrorPolicy,
    sink: S,
    aggregator: DiscInfoAggregator,
    summary: SessionSummary,
}

impl<S: ProgressSink> RipSession<S> {
    pub fn new(policy: ErrorPolicy, sink: S) -> Self {
        Self {
            policy,
            sink,
            aggregator: DiscInfoAggregator::new(),
            summary: SessionSummary::default(),
        }
    }

    /// Decode one line and route the result
    ///
    /// Under [`ErrorPolicy::Abort`] the first decode or aggregation failure is
    /// returned; under [`ErrorPolicy::Skip`] it is logged and counted.
    pub fn feed_line(&mut self, line: &str) -> Result<LineOutcome> {
        self.summary.lines_read += 1;
        let line_number = self.summary.lines_read;

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(LineOutcome::Blank);
        }

        let message = match decode(line) {
            Ok(message) => message,
            Err(e) => return self.reject(line_number, line, e.into()),
        };

        if let Message::General(general) = &message {
            debug!("MakeMKV message {}: {}", general.code, general.message);
            self.summary.last_message = Some(general.clone());
        }

        match self.aggregator.apply(&message) {
            Ok(true) => {
                self.summary.messages_applied += 1;
                Ok(LineOutcome::Applied)
            }
            Ok(false) => {
                if let Some(event) = RipEvent::from_message(&message) {
                    self.sink.publish(event);
                    self.summary.events_published += 1;
                }
                Ok(LineOutcome::Published)
            }
            Err(e) => self.reject(line_number, line, e.into()),
        }
    }

    /// Feed every line of `reader`
    ///
    /// A line that is not valid UTF-8 is rejected like any other decode
    /// failure. Read errors from `reader` always end the session.
    pub fn feed_reader<R: BufRead>(&mut self, mut reader: R) -> Result<&SessionSummary> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            match std::str::from_utf8(&buf) {
                Ok(line) => {
                    self.feed_line(line)?;
                }
                Err(_) => {
                    self.summary.lines_read += 1;
                    let line_number = self.summary.lines_read;
                    let lossy = String::from_utf8_lossy(&buf);
                    let line = lossy.trim_end_matches(['\r', '\n']);
                    let err = DecodeError::InvalidUtf8(line.to_string());
                    self.reject(line_number, line, err.into())?;
                }
            }
        }

        info!(
            "Session consumed {} lines: {} applied, {} events, {} skipped",
            self.summary.lines_read,
            self.summary.messages_applied,
            self.summary.events_published,
            self.summary.lines_skipped
        );
        Ok(&self.summary)
    }

    fn reject(&mut self, line_number: usize, line: &str, err: Error) -> Result<LineOutcome> {
        match self.policy {
            ErrorPolicy::Abort => {
                error!("Aborting session at line {}: {} ({:?})", line_number, err, line);
                Err(err)
            }
            ErrorPolicy::Skip => {
                warn!("Skipping line {}: {} ({:?})", line_number, err, line);
                self.summary.lines_skipped += 1;
                Ok(LineOutcome::Skipped)
            }
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn disc_info(&self) -> &DiscInfo {
        self.aggregator.disc_info()
    }

    /// End the session, handing over the disc tree
    pub fn finish(self) -> (DiscInfo, SessionSummary) {
        (self.aggregator.into_disc_info(), self.summary)
    }
}
