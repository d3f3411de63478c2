//! Operation records submitted to the sequential engine

use super::primitives::{Address, InvoiceId, Timestamp};
use super::role::Role;
use rust_decimal::Decimal;

/// A protocol entry point with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Issue settlement currency to an account (admin only)
    Fund { account: Address, amount: Decimal },

    /// Grant a role (admin only)
    GrantRole { role: Role, account: Address },

    /// Revoke a role (admin only)
    RevokeRole { role: Role, account: Address },

    /// Change the protocol fee applied at settlement (admin only)
    SetFee { fee_bps: u32 },

    /// Supply liquidity to the vault in exchange for shares
    Deposit { amount: Decimal },

    /// Redeem vault shares for underlying liquidity
    Withdraw { shares: Decimal },

    /// Register a new invoice with the caller as seller
    CreateInvoice {
        buyer: Address,
        amount: Decimal,
        due_date: Timestamp,
        metadata_hash: String,
    },

    /// Draw an advance against one of the caller's invoices
    RequestAdvance { invoice_id: InvoiceId, amount: Decimal },

    /// Pay an invoice in full, triggering settlement
    PayInvoice { invoice_id: InvoiceId, amount: Decimal },
}

impl Operation {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Fund { .. } => "fund",
            Operation::GrantRole { .. } => "grant",
            Operation::RevokeRole { .. } => "revoke",
            Operation::SetFee { .. } => "set_fee",
            Operation::Deposit { .. } => "deposit",
            Operation::Withdraw { .. } => "withdraw",
            Operation::CreateInvoice { .. } => "create",
            Operation::RequestAdvance { .. } => "advance",
            Operation::PayInvoice { .. } => "pay",
        }
    }
}

/// An operation stamped by the sequencer with its time and caller
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    /// Sequencer time; must not go backwards
    pub at: Timestamp,

    /// Principal submitting the operation
    pub caller: Address,

    pub operation: Operation,
}
