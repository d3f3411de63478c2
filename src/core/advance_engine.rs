//! Advance engine
//!
//! This module provides the `AdvanceEngine`, which lends against Issued
//! invoices, and the `AdvanceBook` holding one advance record per invoice.
//!
//! A request is validated completely before anything is mutated:
//! - The invoice exists and the caller is its seller
//! - No advance has ever been recorded for the invoice
//! - The invoice is still Issued and not yet due
//! - The amount is within the configured share of face value
//! - Repayment plus the settlement fee fits inside the invoice amount
//! - The engine holds its capabilities and the vault has the liquidity
//!
//! Only then does it borrow from the vault (funds go straight to the seller),
//! record the advance, and mark the invoice Financed.

use crate::core::access_control::AccessControl;
use crate::core::state::ProtocolState;
use crate::core::traits::SettlementCurrency;
use crate::types::primitives::{apply_bps, truncate_amount, validate_amount};
use crate::types::{
    Address, Advance, InvoiceId, InvoiceStatus, ProtocolError, Role, Timestamp,
    BPS_DENOMINATOR, SECONDS_PER_YEAR,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

const ENTITY: &str = "advance";

/// Advance records keyed by invoice id
///
/// A key, once used, is never freed: an invoice can be financed at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceBook {
    advances: HashMap<InvoiceId, Advance>,
}

impl AdvanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_advance(&self, invoice_id: InvoiceId) -> Result<&Advance, ProtocolError> {
        self.advances
            .get(&invoice_id)
            .ok_or_else(|| ProtocolError::not_found(ENTITY, invoice_id))
    }

    pub fn contains(&self, invoice_id: InvoiceId) -> bool {
        self.advances.contains_key(&invoice_id)
    }

    /// All advances sorted by invoice id
    pub fn advances(&self) -> Vec<&Advance> {
        let mut advances: Vec<&Advance> = self.advances.values().collect();
        advances.sort_by_key(|advance| advance.invoice_id);
        advances
    }

    /// Flip `repaid` on an outstanding advance; requires the Settlement role
    pub fn mark_repaid(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        invoice_id: InvoiceId,
    ) -> Result<(), ProtocolError> {
        acl.require(Role::Settlement, caller)?;
        let advance = self
            .advances
            .get_mut(&invoice_id)
            .ok_or_else(|| ProtocolError::not_found(ENTITY, invoice_id))?;
        if advance.repaid {
            return Err(ProtocolError::invalid_state(
                ENTITY,
                invoice_id,
                "advance already repaid",
            ));
        }
        advance.repaid = true;
        Ok(())
    }

    fn insert(&mut self, advance: Advance) -> Result<(), ProtocolError> {
        if self.advances.contains_key(&advance.invoice_id) {
            return Err(ProtocolError::already_exists(ENTITY, advance.invoice_id));
        }
        self.advances.insert(advance.invoice_id, advance);
        Ok(())
    }
}

/// Simple interest on `principal` at `rate_bps` per year for `seconds`
///
/// Truncated to the currency scale.
pub fn interest_for(
    principal: Decimal,
    rate_bps: u32,
    seconds: u64,
) -> Result<Decimal, ProtocolError> {
    let interest = principal
        .checked_mul(Decimal::from(rate_bps))
        .and_then(|v| v.checked_div(Decimal::from(BPS_DENOMINATOR)))
        .and_then(|v| v.checked_mul(Decimal::from(seconds)))
        .and_then(|v| v.checked_div(Decimal::from(SECONDS_PER_YEAR)))
        .ok_or_else(|| ProtocolError::arithmetic_overflow("interest"))?;
    Ok(truncate_amount(interest))
}

/// Component that originates advances
///
/// Acts on the vault and the registry as its own principal, which must hold
/// the Borrower and AdvanceEngine roles.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceEngine {
    principal: Address,
}

impl AdvanceEngine {
    pub fn new(principal: Address) -> Self {
        AdvanceEngine { principal }
    }

    pub fn principal(&self) -> &Address {
        &self.principal
    }

    /// Validate a request and compute the advance it would create
    ///
    /// Performs every check except the capability and liquidity checks, and
    /// mutates nothing.
    pub fn quote<C: SettlementCurrency>(
        &self,
        state: &ProtocolState<C>,
        caller: &Address,
        invoice_id: InvoiceId,
        requested_amount: Decimal,
        now: Timestamp,
    ) -> Result<Advance, ProtocolError> {
        let invoice = state.registry.get_invoice(invoice_id)?;
        // Only the seller may borrow against an invoice
        if &invoice.seller != caller {
            return Err(ProtocolError::unauthorized(Role::Issuer, caller.as_str()));
        }

        // Unique-key lookup: a financed invoice can never be financed again,
        // even after it has cleared
        if state.advances.contains(invoice_id) {
            return Err(ProtocolError::already_exists(ENTITY, invoice_id));
        }
        state
            .registry
            .ensure_status(invoice_id, InvoiceStatus::Issued)?;

        validate_amount(requested_amount, "advance amount", false)?;
        let max_advance = apply_bps(
            invoice.amount,
            state.config.max_advance_bps,
            "max advance",
        )?;
        if requested_amount > max_advance {
            return Err(ProtocolError::invalid_argument(format!(
                "advance {} exceeds the maximum {} for invoice {}",
                requested_amount, max_advance, invoice_id
            )));
        }

        if invoice.due_date <= now {
            return Err(ProtocolError::invalid_state(
                "invoice",
                invoice_id,
                format!("due date {} has passed", invoice.due_date),
            ));
        }

        let principal = requested_amount;
        let tier = state.reputation.tier(caller);
        let rate_bps = state.config.tier_rates.rate_for(tier);
        let interest = interest_for(principal, rate_bps, invoice.due_date - now)?;
        let total_repayment = principal
            .checked_add(interest)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("total repayment"))?;

        // The buyer's payment must cover repayment and fee, or the invoice
        // could never settle
        let fee = apply_bps(invoice.amount, state.config.fee_bps, "protocol fee")?;
        let required = total_repayment
            .checked_add(fee)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("settlement requirement"))?;
        if required > invoice.amount {
            return Err(ProtocolError::invalid_argument(format!(
                "repayment {} plus fee {} exceeds invoice amount {}",
                total_repayment, fee, invoice.amount
            )));
        }

        Ok(Advance {
            invoice_id,
            seller: caller.clone(),
            advance_amount: principal,
            principal,
            interest,
            total_repayment,
            requested_at: now,
            repaid: false,
        })
    }

    /// Draw an advance against `invoice_id` for its seller
    ///
    /// # Errors
    ///
    /// - `NotFound` if the invoice does not exist
    /// - `Unauthorized` if the caller is not the seller, or the engine lacks
    ///   its capabilities
    /// - `AlreadyExists` if the invoice was ever financed before
    /// - `InvalidState` if the invoice is not Issued or is already due
    /// - `InvalidArgument` for a malformed or excessive amount
    /// - `InsufficientLiquidity` if the vault cannot lend the principal
    ///
    /// On error, nothing has changed.
    pub fn request_advance<C: SettlementCurrency>(
        &self,
        state: &mut ProtocolState<C>,
        caller: &Address,
        invoice_id: InvoiceId,
        requested_amount: Decimal,
        now: Timestamp,
    ) -> Result<Advance, ProtocolError> {
        let advance = self.quote(state, caller, invoice_id, requested_amount, now)?;

        state.access.require(Role::Borrower, &self.principal)?;
        state.access.require(Role::AdvanceEngine, &self.principal)?;
        state.vault.ensure_can_borrow(advance.principal)?;

        let ProtocolState {
            access,
            currency,
            registry,
            advances,
            vault,
            ..
        } = state;

        vault.borrow(access, currency, &self.principal, advance.principal, caller)?;
        advances.insert(advance.clone())?;
        registry.mark_financed(access, &self.principal, invoice_id)?;

        Ok(advance)
    }
}
