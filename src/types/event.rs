//! Read-model events
//!
//! Every committed state transition produces one or more events. The log is
//! append-only: events of a rejected operation are never recorded, and a
//! recorded event is never retracted.

use super::primitives::{Address, InvoiceId, Timestamp};
use super::reputation::Tier;
use super::role::Role;
use rust_decimal::Decimal;

/// A state transition observable by dashboards and audit tooling
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    RoleGranted {
        role: Role,
        account: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
    },
    /// Settlement currency issued to an account
    Funded {
        account: Address,
        amount: Decimal,
    },
    FeeUpdated {
        fee_bps: u32,
    },
    VaultDeposited {
        depositor: Address,
        amount: Decimal,
        shares: Decimal,
    },
    VaultWithdrawn {
        depositor: Address,
        shares: Decimal,
        amount: Decimal,
    },
    InvoiceCreated {
        invoice_id: InvoiceId,
        seller: Address,
        buyer: Address,
        amount: Decimal,
        due_date: Timestamp,
    },
    InvoiceFinanced {
        invoice_id: InvoiceId,
        seller: Address,
        principal: Decimal,
        interest: Decimal,
        total_repayment: Decimal,
    },
    InvoiceSettled {
        invoice_id: InvoiceId,
        payer: Address,
        amount: Decimal,
        vault_repayment: Decimal,
        protocol_fee: Decimal,
        seller_proceeds: Decimal,
    },
    ReputationUpdated {
        seller: Address,
        score: u32,
        tier: Tier,
        invoices_cleared: u64,
        total_volume: Decimal,
    },
}

impl ProtocolEvent {
    /// Snake-case event name used in the event log output
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::RoleGranted { .. } => "role_granted",
            ProtocolEvent::RoleRevoked { .. } => "role_revoked",
            ProtocolEvent::Funded { .. } => "funded",
            ProtocolEvent::FeeUpdated { .. } => "fee_updated",
            ProtocolEvent::VaultDeposited { .. } => "vault_deposited",
            ProtocolEvent::VaultWithdrawn { .. } => "vault_withdrawn",
            ProtocolEvent::InvoiceCreated { .. } => "invoice_created",
            ProtocolEvent::InvoiceFinanced { .. } => "invoice_financed",
            ProtocolEvent::InvoiceSettled { .. } => "invoice_settled",
            ProtocolEvent::ReputationUpdated { .. } => "reputation_updated",
        }
    }
}

/// An event with its position in the log
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Strictly increasing, starting at 1
    pub sequence: u64,
    /// Sequencer time of the operation that emitted the event
    pub at: Timestamp,
    pub event: ProtocolEvent,
}
