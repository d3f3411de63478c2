//! Invoice registry
//!
//! This module provides the `InvoiceRegistry`, the sole owner of invoice
//! records and of the invoice ownership tokens. It is responsible for:
//! - Registering invoices and minting their ownership token exactly once
//! - Enforcing the forward-only status machine
//!   (`Issued → Financed → Paid → Cleared`)
//! - Capability checks on every status transition
//!
//! Read-only status checks are exposed separately so that orchestrating
//! operations can validate every precondition before mutating anything.

use crate::core::access_control::AccessControl;
use crate::types::primitives::validate_amount;
use crate::types::{
    Address, Invoice, InvoiceId, InvoiceStatus, ProtocolError, Role, Timestamp,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

const ENTITY: &str = "invoice";

/// Canonical store of invoices and their ownership tokens
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRegistry {
    /// Map of invoice id to invoice record
    invoices: HashMap<InvoiceId, Invoice>,

    /// Ownership token per invoice id (token id == invoice id)
    owners: HashMap<InvoiceId, Address>,

    /// Id the next registered invoice receives
    next_id: InvoiceId,
}

impl InvoiceRegistry {
    pub fn new() -> Self {
        InvoiceRegistry {
            invoices: HashMap::new(),
            owners: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a new invoice with `caller` as seller
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if `caller` lacks the Issuer role
    /// - `InvalidArgument` if `amount` is zero, negative or too precise, or
    ///   `due_date` is not strictly after `now`
    /// - `AlreadyExists` if an ownership token already exists for the new id
    #[allow(clippy::too_many_arguments)]
    pub fn create_invoice(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        buyer: Address,
        amount: Decimal,
        due_date: Timestamp,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<InvoiceId, ProtocolError> {
        acl.require(Role::Issuer, caller)?;
        validate_amount(amount, "invoice amount", false)?;

        if due_date <= now {
            return Err(ProtocolError::invalid_argument(format!(
                "due date {} is not after current time {}",
                due_date, now
            )));
        }

        let id = self.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("invoice id"))?;
        if self.owners.contains_key(&id) {
            return Err(ProtocolError::already_exists("ownership token", id));
        }

        self.invoices.insert(
            id,
            Invoice {
                id,
                seller: caller.clone(),
                buyer,
                amount,
                due_date,
                status: InvoiceStatus::Issued,
                metadata_hash,
                created_at: now,
                paid_at: None,
                cleared_at: None,
            },
        );
        self.owners.insert(id, caller.clone());
        self.next_id = next_id;

        Ok(id)
    }

    /// Look up an invoice
    pub fn get_invoice(&self, id: InvoiceId) -> Result<&Invoice, ProtocolError> {
        self.invoices
            .get(&id)
            .ok_or_else(|| ProtocolError::not_found(ENTITY, id))
    }

    /// Holder of the invoice's ownership token
    pub fn owner_of(&self, id: InvoiceId) -> Result<&Address, ProtocolError> {
        self.owners
            .get(&id)
            .ok_or_else(|| ProtocolError::not_found(ENTITY, id))
    }

    /// Fail with `InvalidState` unless the invoice currently has `expected` status
    pub fn ensure_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
    ) -> Result<&Invoice, ProtocolError> {
        let invoice = self.get_invoice(id)?;
        if invoice.status != expected {
            return Err(ProtocolError::invalid_state(
                ENTITY,
                id,
                format!("expected {}, found {}", expected, invoice.status),
            ));
        }
        Ok(invoice)
    }

    /// Issued → Financed; requires the AdvanceEngine role
    pub fn mark_financed(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        id: InvoiceId,
    ) -> Result<(), ProtocolError> {
        acl.require(Role::AdvanceEngine, caller)?;
        self.transition(id, InvoiceStatus::Issued)?;
        Ok(())
    }

    /// Financed → Paid; requires the Settlement role
    pub fn mark_paid(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        id: InvoiceId,
        now: Timestamp,
    ) -> Result<(), ProtocolError> {
        acl.require(Role::Settlement, caller)?;
        let invoice = self.transition(id, InvoiceStatus::Financed)?;
        invoice.paid_at = Some(now);
        Ok(())
    }

    /// Paid → Cleared; requires the Settlement role. Terminal.
    pub fn mark_cleared(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        id: InvoiceId,
        now: Timestamp,
    ) -> Result<(), ProtocolError> {
        acl.require(Role::Settlement, caller)?;
        let invoice = self.transition(id, InvoiceStatus::Paid)?;
        invoice.cleared_at = Some(now);
        Ok(())
    }

    /// All invoices sorted by id
    pub fn invoices(&self) -> Vec<&Invoice> {
        let mut invoices: Vec<&Invoice> = self.invoices.values().collect();
        invoices.sort_by_key(|invoice| invoice.id);
        invoices
    }

    /// Move an invoice from `from` to its successor status
    fn transition(
        &mut self,
        id: InvoiceId,
        from: InvoiceStatus,
    ) -> Result<&mut Invoice, ProtocolError> {
        self.ensure_status(id, from)?;
        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or_else(|| ProtocolError::not_found(ENTITY, id))?;
        let next = from
            .next()
            .ok_or_else(|| ProtocolError::invalid_state(ENTITY, id, "invoice is cleared"))?;
        invoice.status = next;
        Ok(invoice)
    }
}

impl Default for InvoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
