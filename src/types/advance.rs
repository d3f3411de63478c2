//! Advance records

use super::primitives::{Address, InvoiceId, Timestamp};
use rust_decimal::Decimal;

/// Short-term loan drawn from the vault against an invoice
///
/// At most one exists per invoice id, for all time.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub invoice_id: InvoiceId,

    /// Seller that received the disbursement
    pub seller: Address,

    /// Amount disbursed to the seller (equal to `principal`)
    pub advance_amount: Decimal,

    /// Amount borrowed from the vault
    pub principal: Decimal,

    /// Interest accrued to the due date at the seller's tier rate
    pub interest: Decimal,

    /// Always `principal + interest`
    pub total_repayment: Decimal,

    pub requested_at: Timestamp,

    /// Flips to true exactly once, during settlement
    pub repaid: bool,
}
