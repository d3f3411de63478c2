//! Invoice records and the status state machine

use super::primitives::{Address, InvoiceId, Timestamp};
use rust_decimal::Decimal;
use std::fmt;

/// Lifecycle status of an invoice
///
/// Transitions are strictly forward: `Issued → Financed → Paid → Cleared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvoiceStatus {
    /// Registered by the seller, no advance drawn yet
    Issued,
    /// An advance has been drawn against the invoice
    Financed,
    /// The buyer's payment has been accepted
    Paid,
    /// Proceeds distributed; terminal
    Cleared,
}

impl InvoiceStatus {
    /// The only status this one may move to, `None` for the terminal status
    pub fn next(&self) -> Option<InvoiceStatus> {
        match self {
            InvoiceStatus::Issued => Some(InvoiceStatus::Financed),
            InvoiceStatus::Financed => Some(InvoiceStatus::Paid),
            InvoiceStatus::Paid => Some(InvoiceStatus::Cleared),
            InvoiceStatus::Cleared => None,
        }
    }

    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Financed => "financed",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cleared => "cleared",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical invoice record owned by the invoice registry
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    /// Unique, immutable identifier
    pub id: InvoiceId,

    /// Principal that registered the invoice and receives proceeds
    pub seller: Address,

    /// Principal expected to pay
    pub buyer: Address,

    /// Face value in settlement currency units (6 decimals)
    pub amount: Decimal,

    /// Due date; strictly after `created_at`
    pub due_date: Timestamp,

    pub status: InvoiceStatus,

    /// Hash of the off-ledger invoice document
    pub metadata_hash: String,

    pub created_at: Timestamp,

    /// Set when the status becomes Paid
    pub paid_at: Option<Timestamp>,

    /// Set when the status becomes Cleared
    pub cleared_at: Option<Timestamp>,
}
