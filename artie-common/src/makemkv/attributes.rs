//! Attribute catalog
//!
//! MakeMKV reports disc, title and stream metadata as numbered attributes
//! (`CINFO`, `TINFO` and `SINFO` lines). The numbering comes from `apdefs.h`
//! in the MakeMKV v1.17.7 sources and covers codes 0 through 50.
//!
//! [`lookup`] is total: codes outside the table resolve to
//! [`AttributeKind::Unknown`], which keeps the raw code around for logging.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Semantic kind of a disc, title or stream attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    /// Code 0, reported by MakeMKV as "unknown"
    Undefined,
    Type,
    Name,
    LangCode,
    LangName,
    CodecId,
    CodecShort,
    CodecLong,
    ChapterCount,
    Duration,
    DiskSize,
    DiskSizeBytes,
    StreamTypeExtension,
    Bitrate,
    AudioChannelsCount,
    AngleInfo,
    SourceFileName,
    AudioSampleRate,
    AudioSampleSize,
    VideoSize,
    VideoAspectRatio,
    VideoFrameRate,
    StreamFlags,
    DateTime,
    OriginalTitleId,
    SegmentsCount,
    SegmentsMap,
    OutputFileName,
    MetadataLanguageCode,
    MetadataLanguageName,
    TreeInfo,
    PanelTitle,
    VolumeName,
    OrderWeight,
    OutputFormat,
    OutputFormatDescription,
    SeamlessInfo,
    PanelText,
    MkvFlags,
    MkvFlagsText,
    AudioChannelLayoutName,
    OutputCodecShort,
    OutputConversionType,
    OutputAudioSampleRate,
    OutputAudioSampleSize,
    OutputAudioChannelsCount,
    OutputAudioChannelLayoutName,
    OutputAudioChannelLayout,
    OutputAudioMixDescription,
    Comment,
    OffsetSequenceId,
    /// Code not present in the catalog
    Unknown(i32),
}

/// Catalog indexed by attribute code
const ATTRIBUTE_TABLE: [(AttributeKind, &str); 51] = [
    (AttributeKind::Undefined, "UNDEFINED"),
    (AttributeKind::Type, "TYPE"),
    (AttributeKind::Name, "NAME"),
    (AttributeKind::LangCode, "LANG_CODE"),
    (AttributeKind::LangName, "LANG_NAME"),
    (AttributeKind::CodecId, "CODEC_ID"),
    (AttributeKind::CodecShort, "CODEC_SHORT"),
    (AttributeKind::CodecLong, "CODEC_LONG"),
    (AttributeKind::ChapterCount, "CHAPTER_COUNT"),
    (AttributeKind::Duration, "DURATION"),
    (AttributeKind::DiskSize, "DISK_SIZE"),
    (AttributeKind::DiskSizeBytes, "DISK_SIZE_BYTES"),
    (AttributeKind::StreamTypeExtension, "STREAM_TYPE_EXTENSION"),
    (AttributeKind::Bitrate, "BITRATE"),
    (AttributeKind::AudioChannelsCount, "AUDIO_CHANNELS_COUNT"),
    (AttributeKind::AngleInfo, "ANGLE_INFO"),
    (AttributeKind::SourceFileName, "SOURCE_FILE_NAME"),
    (AttributeKind::AudioSampleRate, "AUDIO_SAMPLE_RATE"),
    (AttributeKind::AudioSampleSize, "AUDIO_SAMPLE_SIZE"),
    (AttributeKind::VideoSize, "VIDEO_SIZE"),
    (AttributeKind::VideoAspectRatio, "VIDEO_ASPECT_RATIO"),
    (AttributeKind::VideoFrameRate, "VIDEO_FRAME_RATE"),
    (AttributeKind::StreamFlags, "STREAM_FLAGS"),
    (AttributeKind::DateTime, "DATE_TIME"),
    (AttributeKind::OriginalTitleId, "ORIGINAL_TITLE_ID"),
    (AttributeKind::SegmentsCount, "SEGMENTS_COUNT"),
    (AttributeKind::SegmentsMap, "SEGMENTS_MAP"),
    (AttributeKind::OutputFileName, "OUTPUT_FILE_NAME"),
    (AttributeKind::MetadataLanguageCode, "METADATA_LANGUAGE_CODE"),
    (AttributeKind::MetadataLanguageName, "METADATA_LANGUAGE_NAME"),
    (AttributeKind::TreeInfo, "TREE_INFO"),
    (AttributeKind::PanelTitle, "PANEL_TITLE"),
    (AttributeKind::VolumeName, "VOLUME_NAME"),
    (AttributeKind::OrderWeight, "ORDER_WEIGHT"),
    (AttributeKind::OutputFormat, "OUTPUT_FORMAT"),
    (AttributeKind::OutputFormatDescription, "OUTPUT_FORMAT_DESCRIPTION"),
    (AttributeKind::SeamlessInfo, "SEAMLESS_INFO"),
    (AttributeKind::PanelText, "PANEL_TEXT"),
    (AttributeKind::MkvFlags, "MKV_FLAGS"),
    (AttributeKind::MkvFlagsText, "MKV_FLAGS_TEXT"),
    (AttributeKind::AudioChannelLayoutName, "AUDIO_CHANNEL_LAYOUT_NAME"),
    (AttributeKind::OutputCodecShort, "OUTPUT_CODEC_SHORT"),
    (AttributeKind::OutputConversionType, "OUTPUT_CONVERSION_TYPE"),
    (AttributeKind::OutputAudioSampleRate, "OUTPUT_AUDIO_SAMPLE_RATE"),
    (AttributeKind::OutputAudioSampleSize, "OUTPUT_AUDIO_SAMPLE_SIZE"),
    (AttributeKind::OutputAudioChannelsCount, "OUTPUT_AUDIO_CHANNELS_COUNT"),
    (AttributeKind::OutputAudioChannelLayoutName, "OUTPUT_AUDIO_CHANNEL_LAYOUT_NAME"),
    (AttributeKind::OutputAudioChannelLayout, "OUTPUT_AUDIO_CHANNEL_LAYOUT"),
    (AttributeKind::OutputAudioMixDescription, "OUTPUT_AUDIO_MIX_DESCRIPTION"),
    (AttributeKind::Comment, "COMMENT"),
    (AttributeKind::OffsetSequenceId, "OFFSET_SEQUENCE_ID"),
];

/// Resolve a numeric attribute code to its kind
///
/// Never fails. Codes outside `0..=50` become [`AttributeKind::Unknown`].
///
/// # Examples
///
/// ```
/// use artie_common::makemkv::{lookup, AttributeKind};
///
/// assert_eq!(lookup(2), AttributeKind::Name);
/// assert_eq!(lookup(27), AttributeKind::OutputFileName);
/// assert_eq!(lookup(5000), AttributeKind::Unknown(5000));
/// ```
pub fn lookup(code: i32) -> AttributeKind {
    usize::try_from(code)
        .ok()
        .and_then(|index| ATTRIBUTE_TABLE.get(index))
        .map(|(kind, _)| *kind)
        .unwrap_or(AttributeKind::Unknown(code))
}

impl AttributeKind {
    /// Numeric protocol code for this kind
    pub fn code(&self) -> i32 {
        match self {
            AttributeKind::Unknown(code) => *code,
            known => ATTRIBUTE_TABLE
                .iter()
                .position(|(kind, _)| kind == known)
                .map(|index| index as i32)
                .unwrap_or_default(),
        }
    }

    /// Protocol name (`NAME`, `OUTPUT_FILE_NAME`, ...), `None` for unknown codes
    pub fn name(&self) -> Option<&'static str> {
        match self {
            AttributeKind::Unknown(_) => None,
            known => ATTRIBUTE_TABLE
                .iter()
                .find(|(kind, _)| kind == known)
                .map(|(_, name)| *name),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AttributeKind::Unknown(_))
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN({})", self.code()),
        }
    }
}

/// Error returned when a string is not a catalog name or `UNKNOWN(<code>)`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized attribute name: {0}")]
pub struct ParseAttributeKindError(pub String);

impl FromStr for AttributeKind {
    type Err = ParseAttributeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((kind, _)) = ATTRIBUTE_TABLE.iter().find(|(_, name)| *name == s) {
            return Ok(*kind);
        }

        s.strip_prefix("UNKNOWN(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|code| code.parse::<i32>().ok())
            .map(lookup)
            .ok_or_else(|| ParseAttributeKindError(s.to_string()))
    }
}

// Serialized as the display name so kinds can key JSON objects.
impl Serialize for AttributeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AttributeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single `(kind, value)` pair reported for a disc, title or stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub value: String,
}

impl Attribute {
    pub fn new(kind: AttributeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
