//! Robot-mode message decoding
//!
//! Every line MakeMKV prints in robot mode has the shape
//! `TAG:field0,field1,...`. The tag picks one of nine message shapes, each
//! with a minimum field count and fixed positions for the values we keep.
//! String fields arrive wrapped in double quotes; one leading and one trailing
//! quote are stripped, nothing else is unescaped.
//!
//! Fields are split on every comma, quoted or not. A disc or title name that
//! itself contains a comma is therefore mis-split and its value truncated.
//! MakeMKV gives no framing guarantee beyond this, so the behaviour is kept
//! as-is for compatibility with existing transcripts.

use serde::{Deserialize, Serialize};

use super::attributes::{lookup, Attribute};
use super::drive::{DriveState, MediaFlags};
use super::error::DecodeError;

/// `CINFO`: attribute of the disc itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscAttributeMessage {
    pub attribute: Attribute,
}

/// `DRV`: state of one drive known to MakeMKV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveMessage {
    pub index: i32,
    pub state: DriveState,
    pub flags: MediaFlags,
    pub drive_name: String,
    pub disc_name: String,
    pub device: String,
}

/// `MSG`: human readable status or error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralMessage {
    pub code: i32,
    pub message: String,
}

/// Which progress label a `PRGT`/`PRGC` line updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    /// `PRGT`: the overall operation
    Title,
    /// `PRGC`: the current sub-operation
    Current,
}

/// `PRGT` / `PRGC`: label for the overall or current operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTitleMessage {
    pub kind: ProgressKind,
    pub id: i32,
    pub code: i32,
    pub name: String,
}

/// `PRGV`: progress counters for the current and overall operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressValueMessage {
    pub current: i32,
    pub total: i32,
    pub max: i32,
}

impl ProgressValueMessage {
    /// Progress of the current sub-operation in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        Self::ratio(self.current, self.max)
    }

    /// Progress of the overall operation in `0.0..=1.0`
    pub fn total_fraction(&self) -> f64 {
        Self::ratio(self.total, self.max)
    }

    fn ratio(value: i32, max: i32) -> f64 {
        if max <= 0 {
            return 0.0;
        }
        (value as f64 / max as f64).clamp(0.0, 1.0)
    }
}

/// `SINFO`: attribute of one stream within a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAttributeMessage {
    pub title_index: i32,
    pub stream_index: i32,
    pub attribute: Attribute,
}

/// `TCOUNT`: number of titles found on the disc
///
/// Can differ from the number of MKV files produced, since titles may be
/// dropped by options such as a minimum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleCountMessage {
    pub count: i32,
}

/// `TINFO`: attribute of one title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleAttributeMessage {
    pub title_index: i32,
    pub attribute: Attribute,
}

/// One decoded robot-mode line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    DiscAttribute(DiscAttributeMessage),
    Drive(DriveMessage),
    General(GeneralMessage),
    ProgressTitle(ProgressTitleMessage),
    ProgressValue(ProgressValueMessage),
    StreamAttribute(StreamAttributeMessage),
    TitleCount(TitleCountMessage),
    TitleAttribute(TitleAttributeMessage),
}

impl Message {
    /// Wire tag this message was decoded from
    pub fn tag(&self) -> &'static str {
        match self {
            Message::DiscAttribute(_) => "CINFO",
            Message::Drive(_) => "DRV",
            Message::General(_) => "MSG",
            Message::ProgressTitle(m) => match m.kind {
                ProgressKind::Title => "PRGT",
                ProgressKind::Current => "PRGC",
            },
            Message::ProgressValue(_) => "PRGV",
            Message::StreamAttribute(_) => "SINFO",
            Message::TitleCount(_) => "TCOUNT",
            Message::TitleAttribute(_) => "TINFO",
        }
    }

    /// True for messages that feed the disc information tree
    pub fn is_disc_info(&self) -> bool {
        matches!(
            self,
            Message::DiscAttribute(_)
                | Message::StreamAttribute(_)
                | Message::TitleCount(_)
                | Message::TitleAttribute(_)
        )
    }
}

/// Comma-split body of one line, tied to its tag for error reporting
struct Fields<'a> {
    tag: &'static str,
    fields: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(tag: &'static str, body: &'a str, required: usize) -> Result<Self, DecodeError> {
        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() < required {
            return Err(DecodeError::MissingFields {
                tag,
                expected: required,
                found: fields.len(),
            });
        }
        Ok(Self { tag, fields })
    }

    fn int(&self, position: usize) -> Result<i32, DecodeError> {
        let raw = self.fields[position];
        raw.parse::<i32>().map_err(|_| DecodeError::FieldParseError {
            tag: self.tag,
            field: position,
            value: raw.to_string(),
        })
    }

    fn text(&self, position: usize) -> String {
        unquote(self.fields[position]).to_string()
    }

    fn attribute(&self, code_position: usize, value_position: usize) -> Result<Attribute, DecodeError> {
        let kind = lookup(self.int(code_position)?);
        Ok(Attribute::new(kind, self.text(value_position)))
    }
}

/// Strip one leading and one trailing double quote, if present
fn unquote(field: &str) -> &str {
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}

/// Decode one robot-mode line
///
/// Pure function of its input. Trailing CR/LF is ignored; anything else
/// malformed is reported as a [`DecodeError`], never as a partial message.
///
/// # Examples
///
/// ```
/// use artie_common::makemkv::{decode, AttributeKind, Message};
///
/// let msg = decode(r#"TINFO:3,27,0,"The A-Team_t00.mkv""#).unwrap();
/// match msg {
///     Message::TitleAttribute(tinfo) => {
///         assert_eq!(tinfo.title_index, 3);
///         assert_eq!(tinfo.attribute.kind, AttributeKind::OutputFileName);
///         assert_eq!(tinfo.attribute.value, "The A-Team_t00.mkv");
///     }
///     other => panic!("unexpected message {:?}", other),
/// }
/// ```
pub fn decode(line: &str) -> Result<Message, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);

    let (tag, body) = line
        .split_once(':')
        .ok_or_else(|| DecodeError::MalformedLine(line.to_string()))?;

    match tag {
        "CINFO" => {
            let f = Fields::new("CINFO", body, 3)?;
            Ok(Message::DiscAttribute(DiscAttributeMessage {
                attribute: f.attribute(0, 2)?,
            }))
        }
        "DRV" => {
            let f = Fields::new("DRV", body, 7)?;
            Ok(Message::Drive(DriveMessage {
                index: f.int(0)?,
                state: DriveState::from_code(f.int(1)?),
                flags: MediaFlags::from_bits_retain(f.int(3)?),
                drive_name: f.text(4),
                disc_name: f.text(5),
                device: f.text(6),
            }))
        }
        "MSG" => {
            let f = Fields::new("MSG", body, 4)?;
            Ok(Message::General(GeneralMessage {
                code: f.int(0)?,
                message: f.text(3),
            }))
        }
        "PRGT" => decode_progress_title("PRGT", ProgressKind::Title, body),
        "PRGC" => decode_progress_title("PRGC", ProgressKind::Current, body),
        "PRGV" => {
            let f = Fields::new("PRGV", body, 3)?;
            Ok(Message::ProgressValue(ProgressValueMessage {
                current: f.int(0)?,
                total: f.int(1)?,
                max: f.int(2)?,
            }))
        }
        "SINFO" => {
            let f = Fields::new("SINFO", body, 5)?;
            Ok(Message::StreamAttribute(StreamAttributeMessage {
                title_index: f.int(0)?,
                stream_index: f.int(1)?,
                attribute: f.attribute(2, 4)?,
            }))
        }
        "TCOUNT" => {
            let f = Fields::new("TCOUNT", body, 1)?;
            Ok(Message::TitleCount(TitleCountMessage { count: f.int(0)? }))
        }
        "TINFO" => {
            let f = Fields::new("TINFO", body, 4)?;
            Ok(Message::TitleAttribute(TitleAttributeMessage {
                title_index: f.int(0)?,
                attribute: f.attribute(1, 3)?,
            }))
        }
        other => Err(DecodeError::UnrecognizedTag(other.to_string())),
    }
}

fn decode_progress_title(
    tag: &'static str,
    kind: ProgressKind,
    body: &str,
) -> Result<Message, DecodeError> {
    let f = Fields::new(tag, body, 3)?;
    Ok(Message::ProgressTitle(ProgressTitleMessage {
        kind,
        id: f.int(0)?,
        code: f.int(1)?,
        name: f.text(2),
    }))
}
