//! Settlement router
//!
//! Settles a financed invoice when its buyer pays. The payment is split three
//! ways: the vault is repaid the advance's total repayment, the treasury takes
//! the protocol fee, and the seller keeps the remainder. The advance is marked
//! repaid, the invoice moves Financed → Paid → Cleared, and the seller's
//! reputation is credited with the invoice amount.
//!
//! Settlement is all-or-nothing. `prepare` runs every check and computes the
//! full breakdown without touching state; only a successful preparation is
//! committed.

use crate::core::state::ProtocolState;
use crate::core::traits::SettlementCurrency;
use crate::types::primitives::{apply_bps, validate_amount};
use crate::types::{
    Address, InvoiceId, InvoiceStatus, ProtocolError, ReputationRecord, Role, Timestamp,
};
use rust_decimal::Decimal;

/// How a settlement payment is distributed
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementBreakdown {
    pub invoice_id: InvoiceId,
    pub seller: Address,
    pub amount: Decimal,
    pub vault_repayment: Decimal,
    pub protocol_fee: Decimal,
    pub seller_proceeds: Decimal,
}

/// Outcome of a committed settlement
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    pub breakdown: SettlementBreakdown,
    pub reputation: ReputationRecord,
}

/// Component that settles paid invoices
///
/// Acts as its own principal, which must hold the Settlement and Borrower
/// roles. Its currency account stages the payment while it is distributed.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRouter {
    principal: Address,
}

impl SettlementRouter {
    pub fn new(principal: Address) -> Self {
        SettlementRouter { principal }
    }

    pub fn principal(&self) -> &Address {
        &self.principal
    }

    /// Compute the distribution of `amount` for `invoice_id`
    ///
    /// Read-only. Checks the invoice and advance state and the payment
    /// amount, but not the router's capabilities or the payer's balance.
    pub fn quote<C: SettlementCurrency>(
        &self,
        state: &ProtocolState<C>,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<SettlementBreakdown, ProtocolError> {
        let invoice = state
            .registry
            .ensure_status(invoice_id, InvoiceStatus::Financed)?;
        let advance = state.advances.get_advance(invoice_id)?;
        if advance.repaid {
            return Err(ProtocolError::invalid_state(
                "advance",
                invoice_id,
                "advance already repaid",
            ));
        }

        validate_amount(amount, "payment amount", false)?;
        if amount != invoice.amount {
            return Err(ProtocolError::invalid_argument(format!(
                "payment {} does not match invoice amount {}",
                amount, invoice.amount
            )));
        }

        let protocol_fee = apply_bps(amount, state.config.fee_bps, "protocol fee")?;
        let vault_repayment = advance.total_repayment;
        let required = vault_repayment
            .checked_add(protocol_fee)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("settlement requirement"))?;
        if amount < required {
            return Err(ProtocolError::insufficient_payment(required, amount));
        }

        Ok(SettlementBreakdown {
            invoice_id,
            seller: invoice.seller.clone(),
            amount,
            vault_repayment,
            protocol_fee,
            seller_proceeds: amount - required,
        })
    }

    /// Settle `invoice_id` with `amount` paid by `payer`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the invoice or its advance does not exist
    /// - `InvalidState` if the invoice is not Financed or the advance was repaid
    /// - `InvalidArgument` if `amount` is malformed or differs from the invoice amount
    /// - `InsufficientPayment` if `amount` cannot cover repayment plus fee
    /// - `Unauthorized` if the router lacks Settlement or Borrower
    /// - `InsufficientFunds` if the payer cannot cover `amount`
    ///
    /// On error, nothing has changed.
    pub fn pay_invoice<C: SettlementCurrency>(
        &self,
        state: &mut ProtocolState<C>,
        payer: &Address,
        invoice_id: InvoiceId,
        amount: Decimal,
        now: Timestamp,
    ) -> Result<SettlementReceipt, ProtocolError> {
        let breakdown = self.quote(state, invoice_id, amount)?;

        state.access.require(Role::Settlement, &self.principal)?;
        state.access.require(Role::Borrower, &self.principal)?;

        let balance = state.currency.balance_of(payer);
        if balance < amount {
            return Err(ProtocolError::insufficient_funds(
                payer.as_str(),
                balance,
                amount,
            ));
        }
        state.vault.preview_repay(breakdown.vault_repayment)?;
        state
            .reputation
            .preview_update(&breakdown.seller, amount, now)?;

        let ProtocolState {
            config,
            access,
            currency,
            registry,
            advances,
            vault,
            reputation,
        } = state;
        let router = &self.principal;

        currency.transfer(payer, router, amount)?;
        vault.repay(access, currency, router, breakdown.vault_repayment)?;
        currency.transfer(router, &config.treasury, breakdown.protocol_fee)?;
        currency.transfer(router, &breakdown.seller, breakdown.seller_proceeds)?;

        advances.mark_repaid(access, router, invoice_id)?;
        registry.mark_paid(access, router, invoice_id, now)?;
        registry.mark_cleared(access, router, invoice_id, now)?;
        let reputation =
            reputation.update_reputation(access, router, &breakdown.seller, amount, now)?;

        Ok(SettlementReceipt {
            breakdown,
            reputation,
        })
    }
}
