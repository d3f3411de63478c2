//! Append-only event log

use crate::types::{EventRecord, ProtocolEvent, Timestamp};

/// Committed events in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the events of one committed operation
    ///
    /// Sequence numbers continue from the last record, starting at 1.
    pub fn append(&mut self, at: Timestamp, events: impl IntoIterator<Item = ProtocolEvent>) {
        for event in events {
            let sequence = self.records.len() as u64 + 1;
            self.records.push(EventRecord {
                sequence,
                at,
                event,
            });
        }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
