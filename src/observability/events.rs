//! Observable events for typed stores
//!
//! Events are explicit and typed. They cover store declaration, the
//! materialize/persist boundary and payload failures. Casting, reads and
//! writes of individual fields never emit events.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Declaration
    /// A store was declared on a record type for the first time
    StoreDeclared,
    /// An existing store gained or redefined fields
    StoreExtended,
    /// A record type copied its parent's stores
    StoreInherited,
    /// Two stores generated the same accessor name; the later one wins
    AccessorShadowed,

    // Persistence boundary
    /// A non-map value was handed to a codec for dumping
    PayloadRejected,
    /// A stored column could not be decoded
    PayloadMalformed,
    /// A record's snapshots were refreshed after persisting
    SnapshotRefreshed,
    /// A record's stores were re-materialized from storage
    StoreReloaded,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreDeclared => "STORE_DECLARED",
            Event::StoreExtended => "STORE_EXTENDED",
            Event::StoreInherited => "STORE_INHERITED",
            Event::AccessorShadowed => "ACCESSOR_SHADOWED",
            Event::PayloadRejected => "PAYLOAD_REJECTED",
            Event::PayloadMalformed => "PAYLOAD_MALFORMED",
            Event::SnapshotRefreshed => "SNAPSHOT_REFRESHED",
            Event::StoreReloaded => "STORE_RELOADED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreDeclared | Event::StoreExtended | Event::StoreInherited => Severity::Info,
            Event::AccessorShadowed => Severity::Warn,
            Event::PayloadRejected | Event::PayloadMalformed => Severity::Error,
            Event::SnapshotRefreshed | Event::StoreReloaded => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
