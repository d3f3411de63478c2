//! Protocol engine
//!
//! This module provides the `SettlementEngine`, the single sequential
//! executor of protocol operations. It owns every ledger, the sequencer clock
//! and the event log, and routes each operation to the component that
//! implements it:
//! - Admin operations (fund, roles, fee) are handled here
//! - Vault deposits and withdrawals go to the `Vault`
//! - Invoice creation goes to the `InvoiceRegistry`
//! - Advances go to the `AdvanceEngine`
//! - Payments go to the `SettlementRouter`
//!
//! An operation either commits completely, appending its events, or fails
//! with no observable effect other than advancing the clock.

use crate::config::ProtocolConfig;
use crate::core::advance_engine::AdvanceEngine;
use crate::core::event_log::EventLog;
use crate::core::settlement::SettlementRouter;
use crate::core::state::ProtocolState;
use crate::core::token_ledger::TokenLedger;
use crate::core::traits::SettlementCurrency;
use crate::types::primitives::validate_amount;
use crate::types::{
    Address, EventRecord, Invoice, Operation, OperationRecord, ProtocolError, ProtocolEvent,
    Role, Timestamp, BPS_DENOMINATOR,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Principal the advance engine acts as
pub const ADVANCE_ENGINE_PRINCIPAL: &str = "advance-engine";

/// Principal the settlement router acts as
pub const SETTLEMENT_ROUTER_PRINCIPAL: &str = "settlement-router";

/// Currency account holding the vault's idle liquidity
pub const VAULT_ACCOUNT: &str = "vault";

/// Sequential protocol executor
#[derive(Debug, Clone)]
pub struct SettlementEngine<C: SettlementCurrency = TokenLedger> {
    state: ProtocolState<C>,
    advance_engine: AdvanceEngine,
    router: SettlementRouter,
    events: EventLog,
    clock: Timestamp,
}

impl SettlementEngine<TokenLedger> {
    /// Create an engine backed by an empty in-memory token ledger
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration is inconsistent or
    /// names a reserved principal as admin or treasury.
    pub fn new(config: ProtocolConfig) -> Result<Self, ProtocolError> {
        Self::with_currency(config, TokenLedger::new())
    }
}

impl<C: SettlementCurrency> SettlementEngine<C> {
    /// Create an engine over an existing settlement currency
    ///
    /// Performs the genesis grants: the advance engine receives AdvanceEngine
    /// and Borrower, the settlement router receives Settlement and Borrower.
    /// Genesis grants emit no events.
    pub fn with_currency(config: ProtocolConfig, currency: C) -> Result<Self, ProtocolError> {
        config.validate()?;
        ensure_not_reserved(&config.admin)?;
        ensure_not_reserved(&config.treasury)?;

        let advance_engine = AdvanceEngine::new(Address::from(ADVANCE_ENGINE_PRINCIPAL));
        let router = SettlementRouter::new(Address::from(SETTLEMENT_ROUTER_PRINCIPAL));

        let mut state = ProtocolState::new(config, currency, Address::from(VAULT_ACCOUNT));
        state
            .access
            .bootstrap(Role::AdvanceEngine, advance_engine.principal());
        state.access.bootstrap(Role::Borrower, advance_engine.principal());
        state.access.bootstrap(Role::Settlement, router.principal());
        state.access.bootstrap(Role::Borrower, router.principal());

        Ok(SettlementEngine {
            state,
            advance_engine,
            router,
            events: EventLog::new(),
            clock: 0,
        })
    }

    /// Process a single operation record
    ///
    /// The record's time becomes the engine clock, whether or not the
    /// operation succeeds. Events are appended only for committed operations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `record.at` is earlier than the clock or
    /// the record names a protocol principal where an external account is
    /// required, otherwise whatever error the target component reports.
    /// Either way the protocol state and event log are unchanged.
    pub fn process(&mut self, record: OperationRecord) -> Result<(), ProtocolError> {
        if record.at < self.clock {
            return Err(ProtocolError::invalid_argument(format!(
                "operation time {} is before current time {}",
                record.at, self.clock
            )));
        }
        self.clock = record.at;
        check_principals(&record)?;

        let name = record.operation.name();
        let events = self.dispatch(&record.caller, record.operation, record.at)?;
        debug!(
            operation = name,
            caller = %record.caller,
            at = record.at,
            events = events.len(),
            "operation committed"
        );
        self.events.append(record.at, events);

        Ok(())
    }

    fn dispatch(
        &mut self,
        caller: &Address,
        operation: Operation,
        now: Timestamp,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        match operation {
            Operation::Fund { account, amount } => self.fund(caller, account, amount),
            Operation::GrantRole { role, account } => self.grant_role(caller, role, account),
            Operation::RevokeRole { role, account } => self.revoke_role(caller, role, account),
            Operation::SetFee { fee_bps } => self.set_fee(caller, fee_bps),
            Operation::Deposit { amount } => self.deposit(caller, amount),
            Operation::Withdraw { shares } => self.withdraw(caller, shares),
            Operation::CreateInvoice {
                buyer,
                amount,
                due_date,
                metadata_hash,
            } => self.create_invoice(caller, buyer, amount, due_date, metadata_hash, now),
            Operation::RequestAdvance { invoice_id, amount } => {
                let advance = self.advance_engine.request_advance(
                    &mut self.state,
                    caller,
                    invoice_id,
                    amount,
                    now,
                )?;
                Ok(vec![ProtocolEvent::InvoiceFinanced {
                    invoice_id,
                    seller: advance.seller,
                    principal: advance.principal,
                    interest: advance.interest,
                    total_repayment: advance.total_repayment,
                }])
            }
            Operation::PayInvoice { invoice_id, amount } => {
                let receipt =
                    self.router
                        .pay_invoice(&mut self.state, caller, invoice_id, amount, now)?;
                let breakdown = receipt.breakdown;
                let reputation = receipt.reputation;
                Ok(vec![
                    ProtocolEvent::InvoiceSettled {
                        invoice_id,
                        payer: caller.clone(),
                        amount: breakdown.amount,
                        vault_repayment: breakdown.vault_repayment,
                        protocol_fee: breakdown.protocol_fee,
                        seller_proceeds: breakdown.seller_proceeds,
                    },
                    ProtocolEvent::ReputationUpdated {
                        seller: reputation.seller,
                        score: reputation.score,
                        tier: reputation.tier,
                        invoices_cleared: reputation.invoices_cleared,
                        total_volume: reputation.total_volume,
                    },
                ])
            }
        }
    }

    /// Issue settlement currency to `account`; admin only
    fn fund(
        &mut self,
        caller: &Address,
        account: Address,
        amount: Decimal,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        self.state.access.require(Role::Admin, caller)?;
        validate_amount(amount, "fund amount", false)?;
        self.state.currency.mint(&account, amount)?;
        Ok(vec![ProtocolEvent::Funded { account, amount }])
    }

    /// Granting a role already held is accepted and emits nothing
    fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        let changed = self.state.access.grant_role(caller, role, &account)?;
        Ok(if changed {
            vec![ProtocolEvent::RoleGranted { role, account }]
        } else {
            Vec::new()
        })
    }

    fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        let changed = self.state.access.revoke_role(caller, role, &account)?;
        Ok(if changed {
            vec![ProtocolEvent::RoleRevoked { role, account }]
        } else {
            Vec::new()
        })
    }

    fn set_fee(
        &mut self,
        caller: &Address,
        fee_bps: u32,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        self.state.access.require(Role::Admin, caller)?;
        if fee_bps > BPS_DENOMINATOR {
            return Err(ProtocolError::invalid_argument(format!(
                "fee_bps {} exceeds {}",
                fee_bps, BPS_DENOMINATOR
            )));
        }
        self.state.config.fee_bps = fee_bps;
        Ok(vec![ProtocolEvent::FeeUpdated { fee_bps }])
    }

    fn deposit(
        &mut self,
        caller: &Address,
        amount: Decimal,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        let ProtocolState {
            currency, vault, ..
        } = &mut self.state;
        let shares = vault.deposit(currency, caller, amount)?;
        Ok(vec![ProtocolEvent::VaultDeposited {
            depositor: caller.clone(),
            amount,
            shares,
        }])
    }

    fn withdraw(
        &mut self,
        caller: &Address,
        shares: Decimal,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        let ProtocolState {
            currency, vault, ..
        } = &mut self.state;
        let amount = vault.withdraw(currency, caller, shares)?;
        Ok(vec![ProtocolEvent::VaultWithdrawn {
            depositor: caller.clone(),
            shares,
            amount,
        }])
    }

    fn create_invoice(
        &mut self,
        caller: &Address,
        buyer: Address,
        amount: Decimal,
        due_date: Timestamp,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<Vec<ProtocolEvent>, ProtocolError> {
        let ProtocolState {
            access, registry, ..
        } = &mut self.state;
        let invoice_id = registry.create_invoice(
            access,
            caller,
            buyer.clone(),
            amount,
            due_date,
            metadata_hash,
            now,
        )?;
        Ok(vec![ProtocolEvent::InvoiceCreated {
            invoice_id,
            seller: caller.clone(),
            buyer,
            amount,
            due_date,
        }])
    }

    /// All invoices sorted by id
    pub fn invoices(&self) -> Vec<&Invoice> {
        self.state.registry.invoices()
    }

    /// Committed events in sequence order
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Read-only view of every ledger
    pub fn state(&self) -> &ProtocolState<C> {
        &self.state
    }

    /// Time of the latest processed operation
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn advance_engine(&self) -> &AdvanceEngine {
        &self.advance_engine
    }

    pub fn router(&self) -> &SettlementRouter {
        &self.router
    }
}

fn is_reserved(account: &Address) -> bool {
    [ADVANCE_ENGINE_PRINCIPAL, SETTLEMENT_ROUTER_PRINCIPAL, VAULT_ACCOUNT]
        .contains(&account.as_str())
}

fn ensure_not_reserved(account: &Address) -> Result<(), ProtocolError> {
    if is_reserved(account) {
        return Err(ProtocolError::invalid_argument(format!(
            "'{}' is a reserved principal",
            account
        )));
    }
    Ok(())
}

/// Protocol principals never submit operations, receive minted currency or
/// act as buyers. The admin may still revoke and restore the component
/// roles of the advance engine and router; the vault account holds no roles.
fn check_principals(record: &OperationRecord) -> Result<(), ProtocolError> {
    ensure_not_reserved(&record.caller)?;
    match &record.operation {
        Operation::Fund { account, .. } => ensure_not_reserved(account),
        Operation::CreateInvoice { buyer, .. } => ensure_not_reserved(buyer),
        Operation::GrantRole { account, .. } | Operation::RevokeRole { account, .. }
            if account.as_str() == VAULT_ACCOUNT =>
        {
            Err(ProtocolError::invalid_argument(format!(
                "'{}' cannot hold roles",
                account
            )))
        }
        _ => Ok(()),
    }
}
