//! Identifiers, time, and fixed-point amount helpers
//!
//! Amounts are `Decimal` values in the settlement currency's unit with at most
//! [`AMOUNT_SCALE`] decimal places. Every derived quantity (interest, fee,
//! shares) is truncated toward zero to that scale so that value is never
//! created by rounding.

use crate::types::error::ProtocolError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Invoice identifier, assigned sequentially from 1
pub type InvoiceId = u64;

/// Sequencer time in seconds
pub type Timestamp = u64;

/// Decimal places of the settlement currency
pub const AMOUNT_SCALE: u32 = 6;

/// Basis points in one whole (100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Seconds in the 365-day year used for interest accrual
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Opaque principal identifier (seller, buyer, depositor, component)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Address(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address(value.to_string())
    }
}

/// Truncate a derived amount to the currency scale
pub fn truncate_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero)
}

/// Validate a caller-supplied amount
///
/// Rejects negative values and values finer than the currency scale. When
/// `allow_zero` is false a zero amount is rejected as well.
pub fn validate_amount(amount: Decimal, field: &str, allow_zero: bool) -> Result<(), ProtocolError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ProtocolError::invalid_argument(format!(
            "{} must not be negative, got {}",
            field, amount
        )));
    }
    if !allow_zero && amount.is_zero() {
        return Err(ProtocolError::invalid_argument(format!(
            "{} must be greater than zero",
            field
        )));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(ProtocolError::invalid_argument(format!(
            "{} has more than {} decimal places: {}",
            field, AMOUNT_SCALE, amount
        )));
    }
    Ok(())
}

/// `amount * bps / 10_000`, truncated to the currency scale
pub fn apply_bps(amount: Decimal, bps: u32, operation: &str) -> Result<Decimal, ProtocolError> {
    let scaled = amount
        .checked_mul(Decimal::from(bps))
        .and_then(|v| v.checked_div(Decimal::from(BPS_DENOMINATOR)))
        .ok_or_else(|| ProtocolError::arithmetic_overflow(operation))?;
    Ok(truncate_amount(scaled))
}
