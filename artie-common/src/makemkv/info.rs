//! Disc information tree and its aggregator
//!
//! A MakeMKV `info` run describes the disc as a tree: disc attributes, then
//! per-title attributes, then per-stream attributes for each title. Titles and
//! streams are addressed by index and may arrive in any order, so the vectors
//! grow on demand with empty placeholders.
//!
//! Each attribute kind may be recorded once per entity. A repeated write is
//! rejected even when the value matches, so a replayed or misrouted line can
//! never silently change what was recorded.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

use super::attributes::{Attribute, AttributeKind};
use super::error::{Entity, InfoError};
use super::messages::Message;

/// Maximum number of titles accepted per disc
///
/// Application safety cap, not a MakeMKV limit.
pub const MAX_TITLE_COUNT: usize = 100;

/// Maximum number of streams accepted per title
///
/// Application safety cap, not a MakeMKV limit.
pub const MAX_STREAM_COUNT: usize = 100;

/// Attribute map shared by discs, titles and streams
pub type AttributeMap = BTreeMap<AttributeKind, String>;

fn insert_attribute(
    attributes: &mut AttributeMap,
    entity: Entity,
    attr: Attribute,
) -> Result<(), InfoError> {
    match attributes.entry(attr.kind) {
        Entry::Occupied(_) => Err(InfoError::DuplicateAttribute {
            entity,
            kind: attr.kind,
        }),
        Entry::Vacant(slot) => {
            slot.insert(attr.value);
            Ok(())
        }
    }
}

fn check_index(index: i32, entity: Entity, limit: usize) -> Result<usize, InfoError> {
    let position = usize::try_from(index).map_err(|_| InfoError::InvalidIndex { entity, index })?;
    if position >= limit {
        return Err(InfoError::IndexOutOfRange {
            entity,
            index,
            limit,
        });
    }
    Ok(position)
}

fn ensure_len<T: Default>(items: &mut Vec<T>, position: usize) -> &mut T {
    if position >= items.len() {
        items.resize_with(position + 1, T::default);
    }
    &mut items[position]
}

/// One audio, video or subtitle stream of a title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub attributes: AttributeMap,
}

impl StreamInfo {
    /// Record `attr`, rejecting a second value for the same kind
    pub fn add_attribute(&mut self, attr: Attribute) -> Result<(), InfoError> {
        insert_attribute(&mut self.attributes, Entity::Stream, attr)
    }

    pub fn attribute(&self, kind: AttributeKind) -> Option<&str> {
        self.attributes.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// One title (playable feature) on the disc
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleInfo {
    pub attributes: AttributeMap,
    pub streams: Vec<StreamInfo>,
}

impl TitleInfo {
    /// Record `attr`, rejecting a second value for the same kind
    pub fn add_attribute(&mut self, attr: Attribute) -> Result<(), InfoError> {
        insert_attribute(&mut self.attributes, Entity::Title, attr)
    }

    /// Record `attr` on the stream at `stream_index`
    ///
    /// Missing streams up to and including the index are created empty.
    pub fn add_stream_attribute(&mut self, stream_index: i32, attr: Attribute) -> Result<(), InfoError> {
        let position = check_index(stream_index, Entity::Stream, MAX_STREAM_COUNT)?;
        ensure_len(&mut self.streams, position).add_attribute(attr)
    }

    pub fn attribute(&self, kind: AttributeKind) -> Option<&str> {
        self.attributes.get(&kind).map(String::as_str)
    }

    pub fn stream(&self, index: usize) -> Option<&StreamInfo> {
        self.streams.get(index)
    }

    /// True when neither the title nor any of its streams carry attributes
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.streams.iter().all(StreamInfo::is_empty)
    }
}

/// Everything learned about one disc during a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscInfo {
    /// Value of the last `TCOUNT`; not checked against `titles.len()`
    pub title_count: i32,
    pub attributes: AttributeMap,
    pub titles: Vec<TitleInfo>,
}

impl DiscInfo {
    /// Record a disc-level attribute
    pub fn add_attribute(&mut self, attr: Attribute) -> Result<(), InfoError> {
        insert_attribute(&mut self.attributes, Entity::Disc, attr)
    }

    /// Record `attr` on the title at `title_index`
    pub fn add_title_attribute(&mut self, title_index: i32, attr: Attribute) -> Result<(), InfoError> {
        let position = check_index(title_index, Entity::Title, MAX_TITLE_COUNT)?;
        ensure_len(&mut self.titles, position).add_attribute(attr)
    }

    /// Record `attr` on stream `stream_index` of title `title_index`
    ///
    /// Both indices are checked before anything is created, so a rejected
    /// call leaves the tree untouched.
    pub fn add_stream_attribute(
        &mut self,
        title_index: i32,
        stream_index: i32,
        attr: Attribute,
    ) -> Result<(), InfoError> {
        let position = check_index(title_index, Entity::Title, MAX_TITLE_COUNT)?;
        check_index(stream_index, Entity::Stream, MAX_STREAM_COUNT)?;
        ensure_len(&mut self.titles, position).add_stream_attribute(stream_index, attr)
    }

    pub fn attribute(&self, kind: AttributeKind) -> Option<&str> {
        self.attributes.get(&kind).map(String::as_str)
    }

    pub fn title(&self, index: usize) -> Option<&TitleInfo> {
        self.titles.get(index)
    }
}

/// Folds decoded messages into a single [`DiscInfo`]
///
/// One aggregator per rip session. It imposes no ordering on the messages
/// it receives; operations apply in call order and each either fully
/// succeeds or leaves the tree unchanged.
#[derive(Debug, Default)]
pub struct DiscInfoAggregator {
    disc: DiscInfo,
}

impl DiscInfoAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_disc_attribute(&mut self, attr: Attribute) -> Result<(), InfoError> {
        self.disc.add_attribute(attr).inspect_err(|e| debug!("Rejected disc attribute: {}", e))
    }

    pub fn add_title_attribute(&mut self, title_index: i32, attr: Attribute) -> Result<(), InfoError> {
        self.disc
            .add_title_attribute(title_index, attr)
            .inspect_err(|e| debug!("Rejected title attribute: {}", e))
    }

    pub fn add_stream_attribute(
        &mut self,
        title_index: i32,
        stream_index: i32,
        attr: Attribute,
    ) -> Result<(), InfoError> {
        self.disc
            .add_stream_attribute(title_index, stream_index, attr)
            .inspect_err(|e| debug!("Rejected stream attribute: {}", e))
    }

    /// Overwrite the reported title count
    pub fn set_title_count(&mut self, count: i32) {
        debug!("Title count reported: {}", count);
        self.disc.title_count = count;
    }

    /// Apply a decoded message
    ///
    /// Returns `Ok(true)` when the message fed the tree and `Ok(false)` for
    /// messages that carry no disc information (drive, progress, general).
    pub fn apply(&mut self, message: &Message) -> Result<bool, InfoError> {
        match message {
            Message::DiscAttribute(m) => self.add_disc_attribute(m.attribute.clone())?,
            Message::TitleAttribute(m) => {
                self.add_title_attribute(m.title_index, m.attribute.clone())?
            }
            Message::StreamAttribute(m) => {
                self.add_stream_attribute(m.title_index, m.stream_index, m.attribute.clone())?
            }
            Message::TitleCount(m) => self.set_title_count(m.count),
            Message::Drive(_)
            | Message::General(_)
            | Message::ProgressTitle(_)
            | Message::ProgressValue(_) => return Ok(false),
        }
        Ok(true)
    }

    pub fn disc_info(&self) -> &DiscInfo {
        &self.disc
    }

    pub fn into_disc_info(self) -> DiscInfo {
        self.disc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitrate() -> Attribute {
        Attribute::new(AttributeKind::Bitrate, "224 Kb/s")
    }

    #[test]
    fn test_stream_attribute_duplicate_rejected() {
        let mut stream = StreamInfo::default();
        stream.add_attribute(bitrate()).unwrap();
        assert_eq!(stream.attribute(AttributeKind::Bitrate), Some("224 Kb/s"));

        let err = stream.add_attribute(bitrate()).unwrap_err();
        assert_eq!(
            err,
            InfoError::DuplicateAttribute {
                entity: Entity::Stream,
                kind: AttributeKind::Bitrate,
            }
        );
    }

    #[test]
    fn test_title_attribute_duplicate_keeps_first_value() {
        let mut title = TitleInfo::default();
        title
            .add_attribute(Attribute::new(AttributeKind::DiskSize, "26.4 GB"))
            .unwrap();
        assert!(title
            .add_attribute(Attribute::new(AttributeKind::DiskSize, "1.0 GB"))
            .is_err());
        assert_eq!(title.attribute(AttributeKind::DiskSize), Some("26.4 GB"));
    }

    #[test]
    fn test_title_grows_streams() {
        let mut title = TitleInfo::default();
        title.add_stream_attribute(1, bitrate()).unwrap();

        assert_eq!(title.streams.len(), 2);
        assert!(title.streams[0].is_empty());
        assert_eq!(title.streams[1].attribute(AttributeKind::Bitrate), Some("224 Kb/s"));
    }

    #[test]
    fn test_title_stream_bounds() {
        let mut title = TitleInfo::default();
        assert!(matches!(
            title.add_stream_attribute(MAX_STREAM_COUNT as i32, bitrate()),
            Err(InfoError::IndexOutOfRange { entity: Entity::Stream, .. })
        ));
        assert!(matches!(
            title.add_stream_attribute(-1, bitrate()),
            Err(InfoError::InvalidIndex { entity: Entity::Stream, index: -1 })
        ));
        assert!(title.streams.is_empty());
    }

    #[test]
    fn test_disc_grows_titles() {
        let mut disc = DiscInfo::default();
        disc.add_title_attribute(1, Attribute::new(AttributeKind::DiskSize, "26.4 GB"))
            .unwrap();

        assert_eq!(disc.titles.len(), 2);
        assert!(disc.titles[0].is_empty());
        assert_eq!(disc.titles[1].attribute(AttributeKind::DiskSize), Some("26.4 GB"));
    }

    #[test]
    fn test_disc_stream_attribute_creates_title_and_stream() {
        let mut disc = DiscInfo::default();
        disc.add_stream_attribute(1, 0, bitrate()).unwrap();

        assert_eq!(disc.titles.len(), 2);
        assert_eq!(disc.titles[1].streams.len(), 1);
        assert_eq!(
            disc.titles[1].streams[0].attribute(AttributeKind::Bitrate),
            Some("224 Kb/s")
        );
    }

    #[test]
    fn test_rejected_stream_index_does_not_grow_titles() {
        let mut disc = DiscInfo::default();
        let err = disc
            .add_stream_attribute(5, MAX_STREAM_COUNT as i32 + 1, bitrate())
            .unwrap_err();
        assert!(matches!(err, InfoError::IndexOutOfRange { entity: Entity::Stream, .. }));
        assert!(disc.titles.is_empty());

        let err = disc.add_stream_attribute(5, -3, bitrate()).unwrap_err();
        assert!(matches!(err, InfoError::InvalidIndex { entity: Entity::Stream, .. }));
        assert!(disc.titles.is_empty());
    }

    #[test]
    fn test_aggregator_apply_routes_messages() {
        use crate::makemkv::decode;

        let mut agg = DiscInfoAggregator::new();
        assert!(agg.apply(&decode(r#"CINFO:2,0,"Movie""#).unwrap()).unwrap());
        assert!(agg.apply(&decode("TCOUNT:2").unwrap()).unwrap());
        assert!(agg.apply(&decode("TCOUNT:3").unwrap()).unwrap());
        assert!(!agg.apply(&decode("PRGV:1,2,3").unwrap()).unwrap());

        let disc = agg.into_disc_info();
        assert_eq!(disc.title_count, 3);
        assert_eq!(disc.attribute(AttributeKind::Name), Some("Movie"));
        assert!(disc.titles.is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejections_stay_below_warn() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut aggregator = DiscInfoAggregator::new();
            aggregator.add_disc_attribute(bitrate()).unwrap();
            assert!(aggregator.add_disc_attribute(bitrate()).is_err());
            assert!(aggregator.add_title_attribute(-1, bitrate()).is_err());
            assert!(aggregator.add_stream_attribute(0, 100, bitrate()).is_err());
        });

        assert!(logs.0.lock().unwrap().is_empty());
    }
}
