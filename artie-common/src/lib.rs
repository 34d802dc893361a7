//! # artie common library
//!
//! Shared code for the artie disc ripping services:
//! - MakeMKV robot-mode decoding and disc information aggregation
//! - Rip sessions that route decoded lines
//! - Progress event types (RipEvent) and EventBus
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod makemkv;
pub mod session;

pub use error::{Error, Result};
pub use makemkv::{decode, DiscInfo, DiscInfoAggregator, Message};
pub use session::{RipSession, SessionSummary};
