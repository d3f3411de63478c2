//! Core traits
//!
//! The settlement currency is an external collaborator: the engine only needs
//! balances and transfers. This trait lets the in-memory ledger used by the
//! CLI be swapped for another implementation without touching the protocol
//! components.

use crate::types::{Address, ProtocolError};
use rust_decimal::Decimal;

/// Fungible settlement currency with 6-decimal amounts
pub trait SettlementCurrency {
    /// Current balance of `account` (zero for unknown accounts)
    fn balance_of(&self, account: &Address) -> Decimal;

    /// Move `amount` from `from` to `to`
    ///
    /// Fails with `InsufficientFunds` if `from` cannot cover the amount, in
    /// which case no balance changes.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Decimal)
        -> Result<(), ProtocolError>;

    /// Issue new currency to `to` (the on-ramp)
    fn mint(&mut self, to: &Address, amount: Decimal) -> Result<(), ProtocolError>;
}
