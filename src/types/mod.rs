//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `primitives`: identifiers, time, and fixed-point amount helpers
//! - `role`: the closed set of capabilities
//! - `invoice`: invoice records and the status state machine
//! - `advance`: advance records
//! - `reputation`: seller reputation records and tiers
//! - `event`: read-model events
//! - `operation`: operations submitted to the engine
//! - `error`: error types for the settlement engine

pub mod advance;
pub mod error;
pub mod event;
pub mod invoice;
pub mod operation;
pub mod primitives;
pub mod reputation;
pub mod role;

pub use advance::Advance;
pub use error::ProtocolError;
pub use event::{EventRecord, ProtocolEvent};
pub use invoice::{Invoice, InvoiceStatus};
pub use operation::{Operation, OperationRecord};
pub use primitives::{
    Address, InvoiceId, Timestamp, AMOUNT_SCALE, BPS_DENOMINATOR, SECONDS_PER_YEAR,
};
pub use reputation::{ReputationRecord, ReputationStats, Tier};
pub use role::Role;
