//! Rip progress events
//!
//! Messages that do not feed the disc information tree (drive status,
//! progress labels and counters, general messages) are turned into
//! [`RipEvent`]s and handed to a [`ProgressSink`]. [`EventBus`] is the sink
//! used by services; it fans events out over a tokio broadcast channel so
//! HTTP/SSE layers can subscribe without slowing the session down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::makemkv::{
    DriveMessage, DriveState, GeneralMessage, MediaFlags, Message, ProgressKind,
    ProgressTitleMessage, ProgressValueMessage,
};

/// Event emitted while a rip session consumes MakeMKV output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RipEvent {
    /// Drive or inserted media changed
    DriveStatus {
        index: i32,
        state: DriveState,
        flags: MediaFlags,
        drive_name: String,
        disc_name: String,
        device: String,
        timestamp: DateTime<Utc>,
    },

    /// New label for the overall (`Title`) or current (`Current`) operation
    ProgressTitle {
        kind: ProgressKind,
        id: i32,
        code: i32,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress counters
    ProgressValue {
        current: i32,
        total: i32,
        max: i32,
        timestamp: DateTime<Utc>,
    },

    /// Status or error text from MakeMKV
    GeneralMessage {
        code: i32,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl RipEvent {
    /// Build the event for a non disc-info message
    ///
    /// Returns `None` for messages that belong to the disc information tree.
    pub fn from_message(message: &Message) -> Option<Self> {
        let timestamp = Utc::now();
        match message {
            Message::Drive(DriveMessage {
                index,
                state,
                flags,
                drive_name,
                disc_name,
                device,
            }) => Some(RipEvent::DriveStatus {
                index: *index,
                state: *state,
                flags: *flags,
                drive_name: drive_name.clone(),
                disc_name: disc_name.clone(),
                device: device.clone(),
                timestamp,
            }),
            Message::ProgressTitle(ProgressTitleMessage { kind, id, code, name }) => {
                Some(RipEvent::ProgressTitle {
                    kind: *kind,
                    id: *id,
                    code: *code,
                    name: name.clone(),
                    timestamp,
                })
            }
            Message::ProgressValue(ProgressValueMessage { current, total, max }) => {
                Some(RipEvent::ProgressValue {
                    current: *current,
                    total: *total,
                    max: *max,
                    timestamp,
                })
            }
            Message::General(GeneralMessage { code, message }) => Some(RipEvent::GeneralMessage {
                code: *code,
                message: message.clone(),
                timestamp,
            }),
            Message::DiscAttribute(_)
            | Message::StreamAttribute(_)
            | Message::TitleCount(_)
            | Message::TitleAttribute(_) => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RipEvent::DriveStatus { timestamp, .. }
            | RipEvent::ProgressTitle { timestamp, .. }
            | RipEvent::ProgressValue { timestamp, .. }
            | RipEvent::GeneralMessage { timestamp, .. } => *timestamp,
        }
    }
}

/// Receiver of progress events
///
/// Implementations must not block; the session calls `publish` inline while
/// decoding lines.
pub trait ProgressSink {
    fn publish(&self, event: RipEvent);
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn publish(&self, event: RipEvent) {
        (**self).publish(event)
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for std::sync::Arc<T> {
    fn publish(&self, event: RipEvent) {
        (**self).publish(event)
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _event: RipEvent) {}
}

/// Broadcast distribution of [`RipEvent`]s
///
/// Publishing never blocks. Slow subscribers see `Lagged` on their
/// receiver rather than holding up the producer.
///
/// # Examples
///
/// ```
/// use artie_common::events::{EventBus, ProgressSink, RipEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.publish(RipEvent::ProgressValue {
///     current: 1,
///     total: 2,
///     max: 4,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(RipEvent::ProgressValue { current: 1, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RipEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (tokio broadcast requirement). Configured
    /// capacities are validated before reaching here.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RipEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, returning the number of subscribers that received it
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: RipEvent) -> Result<usize, broadcast::error::SendError<RipEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: RipEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ProgressSink for EventBus {
    fn publish(&self, event: RipEvent) {
        self.emit_lossy(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::makemkv::decode;

    #[test]
    fn test_from_message_skips_disc_info() {
        for line in [r#"CINFO:2,0,"x""#, "TCOUNT:1", r#"TINFO:0,2,0,"x""#, r#"SINFO:0,0,2,0,"x""#] {
            let msg = decode(line).unwrap();
            assert!(RipEvent::from_message(&msg).is_none(), "{} should not be an event", line);
        }
    }

    #[test]
    fn test_from_message_drive() {
        let msg = decode(r#"DRV:0,2,999,1,"BD-RE","MOVIE","/dev/sr0""#).unwrap();
        match RipEvent::from_message(&msg) {
            Some(RipEvent::DriveStatus {
                index,
                state,
                flags,
                disc_name,
                device,
                ..
            }) => {
                assert_eq!(index, 0);
                assert_eq!(state, DriveState::Inserted);
                assert!(flags.contains(MediaFlags::DVD_FILES_PRESENT));
                assert_eq!(disc_name, "MOVIE");
                assert_eq!(device, "/dev/sr0");
            }
            other => panic!("expected DriveStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let msg = decode(r#"PRGT:3404,9,"Opening Blu-ray disc""#).unwrap();
        let event = RipEvent::from_message(&msg).unwrap();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "ProgressTitle");
        assert_eq!(json["kind"], "title");
        assert_eq!(json["name"], "Opening Blu-ray disc");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_event_bus_delivers_to_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.capacity(), 8);
        assert!(bus
            .emit(RipEvent::from_message(&decode("PRGV:1,2,3").unwrap()).unwrap())
            .is_err());

        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = RipEvent::from_message(&decode(r#"MSG:5010,0,0,"Failed","Failed""#).unwrap())
            .unwrap();
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(rx1.try_recv().unwrap(), event);
        assert_eq!(rx2.try_recv().unwrap(), event);
    }
}
