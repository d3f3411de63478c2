//! In-memory settlement currency ledger
//!
//! This module provides the `TokenLedger`, a balance map implementing the
//! [`SettlementCurrency`] trait. It is responsible for:
//! - Issuing currency to accounts (the on-ramp)
//! - Moving balances between accounts without creating or destroying value
//! - Reporting balances, with unknown accounts holding zero

use crate::core::traits::SettlementCurrency;
use crate::types::primitives::validate_amount;
use crate::types::{Address, ProtocolError};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Balances of the settlement currency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenLedger {
    /// Map of account to balance; zero balances may or may not be present
    balances: HashMap<Address, Decimal>,

    /// Sum of everything ever minted
    total_supply: Decimal,
}

impl TokenLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Total currency in circulation
    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    /// All non-zero balances sorted by account
    pub fn balances(&self) -> Vec<(&Address, Decimal)> {
        let mut balances: Vec<(&Address, Decimal)> = self
            .balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(account, balance)| (account, *balance))
            .collect();
        balances.sort_by(|a, b| a.0.cmp(b.0));
        balances
    }
}

impl SettlementCurrency for TokenLedger {
    fn balance_of(&self, account: &Address) -> Decimal {
        self.balances.get(account).copied().unwrap_or(Decimal::ZERO)
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Decimal,
    ) -> Result<(), ProtocolError> {
        validate_amount(amount, "transfer amount", true)?;
        if amount.is_zero() || from == to {
            return Ok(());
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(ProtocolError::insufficient_funds(
                from.as_str(),
                from_balance,
                amount,
            ));
        }

        // Compute both sides before touching either balance
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("transfer"))?;
        let new_to = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("transfer"))?;

        self.balances.insert(from.clone(), new_from);
        self.balances.insert(to.clone(), new_to);

        Ok(())
    }

    fn mint(&mut self, to: &Address, amount: Decimal) -> Result<(), ProtocolError> {
        validate_amount(amount, "mint amount", false)?;

        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("mint"))?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("mint"))?;

        self.balances.insert(to.clone(), new_balance);
        self.total_supply = new_supply;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    #[test]
    fn test_mint_credits_account_and_supply() {
        let mut ledger = TokenLedger::new();
        ledger.mint(&addr("alice"), Decimal::new(1000, 0)).unwrap();

        assert_eq!(ledger.balance_of(&addr("alice")), Decimal::new(1000, 0));
        assert_eq!(ledger.total_supply(), Decimal::new(1000, 0));
    }

    #[test]
    fn test_mint_zero_is_rejected() {
        let mut ledger = TokenLedger::new();
        let result = ledger.mint(&addr("alice"), Decimal::ZERO);
        assert!(matches!(result, Err(ProtocolError::InvalidArgument { .. })));
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = TokenLedger::new();
        ledger.mint(&addr("alice"), Decimal::new(1000, 0)).unwrap();

        ledger
            .transfer(&addr("alice"), &addr("bob"), Decimal::new(250_5, 1))
            .unwrap();

        assert_eq!(ledger.balance_of(&addr("alice")), Decimal::new(749_5, 1));
        assert_eq!(ledger.balance_of(&addr("bob")), Decimal::new(250_5, 1));
        assert_eq!(ledger.total_supply(), Decimal::new(1000, 0));
    }

    #[test]
    fn test_transfer_with_insufficient_funds_changes_nothing() {
        let mut ledger = TokenLedger::new();
        ledger.mint(&addr("alice"), Decimal::new(100, 0)).unwrap();
        let before = ledger.clone();

        let result = ledger.transfer(&addr("alice"), &addr("bob"), Decimal::new(101, 0));

        assert_eq!(
            result,
            Err(ProtocolError::insufficient_funds(
                "alice",
                Decimal::new(100, 0),
                Decimal::new(101, 0)
            ))
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_zero_transfer_is_noop() {
        let mut ledger = TokenLedger::new();
        ledger
            .transfer(&addr("nobody"), &addr("bob"), Decimal::ZERO)
            .unwrap();
        assert!(ledger.balances().is_empty());
    }

    #[test]
    fn test_balances_sorted_and_skip_zero() {
        let mut ledger = TokenLedger::new();
        ledger.mint(&addr("zed"), Decimal::new(5, 0)).unwrap();
        ledger.mint(&addr("amy"), Decimal::new(7, 0)).unwrap();
        ledger
            .transfer(&addr("zed"), &addr("amy"), Decimal::new(5, 0))
            .unwrap();

        let balances = ledger.balances();
        assert_eq!(balances, vec![(&addr("amy"), Decimal::new(12, 0))]);
    }
}
