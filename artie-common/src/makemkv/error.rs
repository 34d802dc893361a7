//! Decoder and aggregator error types

use thiserror::Error;

use super::attributes::AttributeKind;

/// Failure to turn one protocol line into a [`super::Message`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Line bytes are not valid UTF-8; carries the lossy rendering
    #[error("Line is not valid UTF-8: {0:?}")]
    InvalidUtf8(String),

    /// Line has no `TAG:` separator
    #[error("Malformed line (no tag separator): {0:?}")]
    MalformedLine(String),

    /// Tag is not one of the nine known message tags
    #[error("Unrecognized message tag: {0:?}")]
    UnrecognizedTag(String),

    /// Line carries fewer fields than the tag requires
    #[error("{tag} message requires {expected} fields, found {found}")]
    MissingFields {
        tag: &'static str,
        expected: usize,
        found: usize,
    },

    /// A numeric field failed to parse as an integer
    #[error("{tag} message field {field} is not an integer: {value:?}")]
    FieldParseError {
        tag: &'static str,
        field: usize,
        value: String,
    },
}

/// Which level of the disc tree an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Disc,
    Title,
    Stream,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Disc => write!(f, "disc"),
            Entity::Title => write!(f, "title"),
            Entity::Stream => write!(f, "stream"),
        }
    }
}

/// Rejected mutation of a [`super::DiscInfo`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InfoError {
    /// Negative title or stream index
    #[error("{entity} index cannot be negative: {index}")]
    InvalidIndex { entity: Entity, index: i32 },

    /// Index at or above the application limit
    #[error("{entity} index {index} exceeds limit of {limit}")]
    IndexOutOfRange {
        entity: Entity,
        index: i32,
        limit: usize,
    },

    /// Attribute kind already recorded for the target entity
    #[error("{entity} attribute {kind} already set")]
    DuplicateAttribute { entity: Entity, kind: AttributeKind },
}
