//! Pooled liquidity vault
//!
//! This module provides the `Vault`, which tracks pooled liquidity and the
//! amount currently lent out to advances. It is responsible for:
//! - Issuing depositor shares proportional to the pool and redeeming them
//! - Lending to the advance engine (Borrower capability)
//! - Accepting repayments, with any excess over outstanding borrow booked as
//!   yield for depositors
//!
//! The vault's settlement-currency balance always equals
//! `total_liquidity - total_borrowed`, and `total_borrowed <= total_liquidity`
//! holds after every operation.

use crate::core::access_control::AccessControl;
use crate::core::traits::SettlementCurrency;
use crate::types::primitives::{truncate_amount, validate_amount};
use crate::types::{Address, ProtocolError, Role};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Liquidity accounting and the depositor share ledger
#[derive(Debug, Clone, PartialEq)]
pub struct Vault {
    /// Settlement-currency account holding the vault's idle liquidity
    account: Address,

    /// Deposits plus accumulated yield, minus withdrawals
    total_liquidity: Decimal,

    /// Principal currently lent out
    total_borrowed: Decimal,

    total_shares: Decimal,

    /// Shares held per depositor
    shares: HashMap<Address, Decimal>,
}

impl Vault {
    /// Create an empty vault holding its liquidity in `account`
    pub fn new(account: Address) -> Self {
        Vault {
            account,
            total_liquidity: Decimal::ZERO,
            total_borrowed: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            shares: HashMap::new(),
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn total_liquidity(&self) -> Decimal {
        self.total_liquidity
    }

    pub fn total_borrowed(&self) -> Decimal {
        self.total_borrowed
    }

    pub fn total_shares(&self) -> Decimal {
        self.total_shares
    }

    /// Liquidity not currently lent out
    pub fn available(&self) -> Decimal {
        self.total_liquidity - self.total_borrowed
    }

    pub fn shares_of(&self, depositor: &Address) -> Decimal {
        self.shares.get(depositor).copied().unwrap_or(Decimal::ZERO)
    }

    /// Shares minted for a deposit of `amount` at the current exchange rate
    pub fn preview_deposit(&self, amount: Decimal) -> Result<Decimal, ProtocolError> {
        validate_amount(amount, "deposit amount", false)?;

        if self.total_shares.is_zero() || self.total_liquidity.is_zero() {
            return Ok(amount);
        }

        let shares = amount
            .checked_mul(self.total_shares)
            .and_then(|v| v.checked_div(self.total_liquidity))
            .ok_or_else(|| ProtocolError::arithmetic_overflow("deposit shares"))?;
        let shares = truncate_amount(shares);

        if shares.is_zero() {
            return Err(ProtocolError::invalid_argument(format!(
                "deposit of {} is too small to mint shares",
                amount
            )));
        }
        Ok(shares)
    }

    /// Underlying liquidity returned for redeeming `shares`
    pub fn preview_withdraw(&self, shares: Decimal) -> Result<Decimal, ProtocolError> {
        validate_amount(shares, "withdraw shares", false)?;
        if self.total_shares.is_zero() {
            return Err(ProtocolError::invalid_argument("vault has no shares outstanding"));
        }

        let assets = shares
            .checked_mul(self.total_liquidity)
            .and_then(|v| v.checked_div(self.total_shares))
            .ok_or_else(|| ProtocolError::arithmetic_overflow("withdraw assets"))?;
        Ok(truncate_amount(assets))
    }

    /// Supply liquidity; open to any depositor
    ///
    /// Returns the number of shares credited.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a zero or malformed amount, or one too small to
    ///   mint any shares
    /// - `InsufficientFunds` if the depositor cannot cover the transfer
    pub fn deposit<C: SettlementCurrency>(
        &mut self,
        currency: &mut C,
        depositor: &Address,
        amount: Decimal,
    ) -> Result<Decimal, ProtocolError> {
        let shares = self.preview_deposit(amount)?;

        let balance = currency.balance_of(depositor);
        if balance < amount {
            return Err(ProtocolError::insufficient_funds(
                depositor.as_str(),
                balance,
                amount,
            ));
        }

        let new_liquidity = self
            .total_liquidity
            .checked_add(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("deposit"))?;
        let new_total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("deposit"))?;
        let new_holder_shares = self
            .shares_of(depositor)
            .checked_add(shares)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("deposit"))?;

        currency.transfer(depositor, &self.account, amount)?;

        self.total_liquidity = new_liquidity;
        self.total_shares = new_total_shares;
        self.shares.insert(depositor.clone(), new_holder_shares);

        Ok(shares)
    }

    /// Redeem `shares` for underlying liquidity
    ///
    /// Returns the amount paid out.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a malformed share amount, more shares than the
    ///   holder owns, or a redemption worth nothing
    /// - `InsufficientLiquidity` if the payout would need liquidity that is
    ///   currently borrowed out
    pub fn withdraw<C: SettlementCurrency>(
        &mut self,
        currency: &mut C,
        holder: &Address,
        shares: Decimal,
    ) -> Result<Decimal, ProtocolError> {
        let held = self.shares_of(holder);
        validate_amount(shares, "withdraw shares", false)?;
        if shares > held {
            return Err(ProtocolError::invalid_argument(format!(
                "'{}' holds {} shares, cannot redeem {}",
                holder, held, shares
            )));
        }

        let assets = self.preview_withdraw(shares)?;
        if assets.is_zero() {
            return Err(ProtocolError::invalid_argument(format!(
                "redeeming {} shares yields nothing",
                shares
            )));
        }
        if assets > self.available() {
            return Err(ProtocolError::insufficient_liquidity(
                assets,
                self.available(),
            ));
        }

        currency.transfer(&self.account, holder, assets)?;

        self.total_liquidity -= assets;
        self.total_shares -= shares;
        let remaining = held - shares;
        if remaining.is_zero() {
            self.shares.remove(holder);
        } else {
            self.shares.insert(holder.clone(), remaining);
        }

        Ok(assets)
    }

    /// Fail with `InsufficientLiquidity` unless `amount` can be lent now
    pub fn ensure_can_borrow(&self, amount: Decimal) -> Result<(), ProtocolError> {
        validate_amount(amount, "borrow amount", false)?;
        let new_borrowed = self
            .total_borrowed
            .checked_add(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("borrow"))?;
        if new_borrowed > self.total_liquidity {
            return Err(ProtocolError::insufficient_liquidity(
                amount,
                self.available(),
            ));
        }
        Ok(())
    }

    /// Lend `amount` to `recipient`; requires the Borrower role
    pub fn borrow<C: SettlementCurrency>(
        &mut self,
        acl: &AccessControl,
        currency: &mut C,
        caller: &Address,
        amount: Decimal,
        recipient: &Address,
    ) -> Result<(), ProtocolError> {
        acl.require(Role::Borrower, caller)?;
        self.ensure_can_borrow(amount)?;

        currency.transfer(&self.account, recipient, amount)?;
        self.total_borrowed += amount;

        Ok(())
    }

    /// Split a repayment into (borrow reduction, yield)
    pub fn preview_repay(&self, amount: Decimal) -> Result<(Decimal, Decimal), ProtocolError> {
        validate_amount(amount, "repay amount", false)?;
        let reduction = amount.min(self.total_borrowed);
        let excess = amount - reduction;
        self.total_liquidity
            .checked_add(excess)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("repay"))?;
        Ok((reduction, excess))
    }

    /// Repay `amount` from the caller's account; requires Borrower or Settlement
    ///
    /// Outstanding borrow drops by `min(amount, total_borrowed)`; anything
    /// above that is added to `total_liquidity` as depositor yield.
    pub fn repay<C: SettlementCurrency>(
        &mut self,
        acl: &AccessControl,
        currency: &mut C,
        caller: &Address,
        amount: Decimal,
    ) -> Result<(), ProtocolError> {
        acl.require_any(&[Role::Borrower, Role::Settlement], caller)?;
        let (reduction, excess) = self.preview_repay(amount)?;

        currency.transfer(caller, &self.account, amount)?;
        self.total_borrowed -= reduction;
        self.total_liquidity += excess;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::token_ledger::TokenLedger;
    use rstest::rstest;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct Fixture {
        acl: AccessControl,
        currency: TokenLedger,
        vault: Vault,
        lp: Address,
        engine: Address,
        seller: Address,
    }

    fn fixture(liquidity: &str) -> Fixture {
        let admin = Address::from("admin");
        let engine = Address::from("advance-engine");
        let lp = Address::from("lp");
        let mut acl = AccessControl::new(admin.clone());
        acl.grant_role(&admin, Role::Borrower, &engine).unwrap();

        let mut currency = TokenLedger::new();
        currency.mint(&lp, d("100000")).unwrap();
        let mut vault = Vault::new(Address::from("vault"));
        if liquidity != "0" {
            vault.deposit(&mut currency, &lp, d(liquidity)).unwrap();
        }

        Fixture {
            acl,
            currency,
            vault,
            lp,
            engine,
            seller: Address::from("alice"),
        }
    }

    fn assert_vault_backed(f: &Fixture) {
        assert!(f.vault.total_borrowed() <= f.vault.total_liquidity());
        assert_eq!(f.currency.balance_of(f.vault.account()), f.vault.available());
    }

    #[test]
    fn test_first_deposit_mints_one_to_one() {
        let f = fixture("5000");
        assert_eq!(f.vault.total_liquidity(), d("5000"));
        assert_eq!(f.vault.shares_of(&f.lp), d("5000"));
        assert_eq!(f.currency.balance_of(&f.lp), d("95000"));
        assert_vault_backed(&f);
    }

    #[test]
    fn test_deposit_after_yield_mints_proportionally() {
        let mut f = fixture("1000");
        // 1000 lent out, 1100 repaid: 100 yield
        f.vault
            .borrow(&f.acl, &mut f.currency, &f.engine, d("1000"), &f.seller)
            .unwrap();
        f.currency.mint(&f.engine, d("1100")).unwrap();
        f.vault
            .repay(&f.acl, &mut f.currency, &f.engine, d("1100"))
            .unwrap();
        assert_eq!(f.vault.total_liquidity(), d("1100"));

        let shares = f.vault.deposit(&mut f.currency, &f.lp, d("550")).unwrap();
        assert_eq!(shares, d("500"));
        assert_vault_backed(&f);
    }

    #[test]
    fn test_deposit_without_funds_fails() {
        let mut f = fixture("0");
        let before = f.vault.clone();
        let result = f
            .vault
            .deposit(&mut f.currency, &Address::from("broke"), d("10"));
        assert!(matches!(result, Err(ProtocolError::InsufficientFunds { .. })));
        assert_eq!(f.vault, before);
    }

    #[rstest]
    #[case::exact("1000", true)]
    #[case::over("1000.000001", false)]
    fn test_borrow_bounded_by_liquidity(#[case] amount: &str, #[case] ok: bool) {
        let mut f = fixture("1000");
        let result = f
            .vault
            .borrow(&f.acl, &mut f.currency, &f.engine, d(amount), &f.seller);

        assert_eq!(result.is_ok(), ok);
        if !ok {
            assert!(matches!(
                result,
                Err(ProtocolError::InsufficientLiquidity { .. })
            ));
            assert_eq!(f.vault.total_borrowed(), Decimal::ZERO);
        }
        assert_vault_backed(&f);
    }

    #[test]
    fn test_borrow_requires_borrower_role() {
        let mut f = fixture("1000");
        let result = f
            .vault
            .borrow(&f.acl, &mut f.currency, &f.seller, d("10"), &f.seller);
        assert_eq!(result, Err(ProtocolError::unauthorized(Role::Borrower, "alice")));
    }

    #[test]
    fn test_repay_excess_becomes_yield() {
        let mut f = fixture("5000");
        f.vault
            .borrow(&f.acl, &mut f.currency, &f.engine, d("800"), &f.seller)
            .unwrap();
        f.currency.mint(&f.engine, d("806.575342")).unwrap();

        f.vault
            .repay(&f.acl, &mut f.currency, &f.engine, d("806.575342"))
            .unwrap();

        assert_eq!(f.vault.total_borrowed(), Decimal::ZERO);
        assert_eq!(f.vault.total_liquidity(), d("5006.575342"));
        assert_vault_backed(&f);
    }

    #[test]
    fn test_partial_repay_reduces_borrow_only() {
        let mut f = fixture("5000");
        f.vault
            .borrow(&f.acl, &mut f.currency, &f.engine, d("800"), &f.seller)
            .unwrap();
        f.currency.mint(&f.engine, d("300")).unwrap();

        f.vault
            .repay(&f.acl, &mut f.currency, &f.engine, d("300"))
            .unwrap();

        assert_eq!(f.vault.total_borrowed(), d("500"));
        assert_eq!(f.vault.total_liquidity(), d("5000"));
        assert_vault_backed(&f);
    }

    #[test]
    fn test_withdraw_limited_to_available_liquidity() {
        let mut f = fixture("1000");
        f.vault
            .borrow(&f.acl, &mut f.currency, &f.engine, d("800"), &f.seller)
            .unwrap();

        let result = f.vault.withdraw(&mut f.currency, &f.lp, d("300"));
        assert_eq!(
            result,
            Err(ProtocolError::insufficient_liquidity(d("300"), d("200")))
        );

        let paid = f.vault.withdraw(&mut f.currency, &f.lp, d("200")).unwrap();
        assert_eq!(paid, d("200"));
        assert_eq!(f.vault.shares_of(&f.lp), d("800"));
        assert_vault_backed(&f);
    }

    #[test]
    fn test_withdraw_includes_yield() {
        let mut f = fixture("5000");
        f.vault
            .borrow(&f.acl, &mut f.currency, &f.engine, d("800"), &f.seller)
            .unwrap();
        f.currency.mint(&f.engine, d("806.575342")).unwrap();
        f.vault
            .repay(&f.acl, &mut f.currency, &f.engine, d("806.575342"))
            .unwrap();

        let paid = f.vault.withdraw(&mut f.currency, &f.lp, d("1000")).unwrap();
        assert_eq!(paid, d("1001.315068"));
        assert_vault_backed(&f);
    }

    #[test]
    fn test_withdraw_more_shares_than_held() {
        let mut f = fixture("100");
        let result = f.vault.withdraw(&mut f.currency, &f.lp, d("100.5"));
        assert!(matches!(result, Err(ProtocolError::InvalidArgument { .. })));
    }

    #[test]
    fn test_full_withdrawal_empties_vault() {
        let mut f = fixture("250");
        let paid = f.vault.withdraw(&mut f.currency, &f.lp, d("250")).unwrap();
        assert_eq!(paid, d("250"));
        assert_eq!(f.vault.total_shares(), Decimal::ZERO);
        assert_eq!(f.vault.total_liquidity(), Decimal::ZERO);
        assert_eq!(f.vault.shares_of(&f.lp), Decimal::ZERO);
    }
}
