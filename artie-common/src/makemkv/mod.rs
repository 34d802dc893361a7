//! MakeMKV robot-mode protocol
//!
//! Decoding of `makemkvcon -r` output lines into typed [`Message`]s and the
//! [`DiscInfoAggregator`] that folds them into a [`DiscInfo`] tree.

mod attributes;
mod drive;
mod error;
mod info;
mod messages;

pub use attributes::{lookup, Attribute, AttributeKind, ParseAttributeKindError};
pub use drive::{DriveState, MediaFlags};
pub use error::{DecodeError, Entity, InfoError};
pub use info::{
    AttributeMap, DiscInfo, DiscInfoAggregator, StreamInfo, TitleInfo, MAX_STREAM_COUNT,
    MAX_TITLE_COUNT,
};
pub use messages::{
    decode, DiscAttributeMessage, DriveMessage, GeneralMessage, Message, ProgressKind,
    ProgressTitleMessage, ProgressValueMessage, StreamAttributeMessage, TitleAttributeMessage,
    TitleCountMessage,
};
