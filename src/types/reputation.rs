//! Seller reputation records and tiers

use super::primitives::{Address, Timestamp};
use rust_decimal::Decimal;
use std::fmt;

/// Discrete reputation class derived from a seller's score
///
/// Ordered so that `C < B < A`; a better tier earns a lower advance rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    C,
    B,
    A,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::C => "C",
            Tier::B => "B",
            Tier::A => "A",
        };
        f.write_str(name)
    }
}

/// Per-seller reputation state
#[derive(Debug, Clone, PartialEq)]
pub struct ReputationRecord {
    pub seller: Address,
    pub score: u32,
    pub tier: Tier,
    pub invoices_cleared: u64,

    /// Sum of settled invoice amounts
    pub total_volume: Decimal,

    pub last_updated: Timestamp,
}

/// Read-only statistics view of a reputation record
#[derive(Debug, Clone, PartialEq)]
pub struct ReputationStats {
    pub invoices_cleared: u64,
    pub total_volume: Decimal,
    pub last_updated: Timestamp,
}
