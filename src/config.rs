//! Protocol configuration
//!
//! Economic policy (fee, advance ratio, tier rates, reputation constants) and
//! the well-known principals (administrator, treasury). All values have
//! defaults; the CLI overrides the commonly tuned ones.

use crate::types::{Address, ProtocolError, Tier, BPS_DENOMINATOR};

/// Annual advance interest rate per reputation tier, in basis points
#[derive(Debug, Clone, PartialEq)]
pub struct TierRates {
    pub c_bps: u32,
    pub b_bps: u32,
    pub a_bps: u32,
}

impl TierRates {
    pub fn rate_for(&self, tier: Tier) -> u32 {
        match tier {
            Tier::C => self.c_bps,
            Tier::B => self.b_bps,
            Tier::A => self.a_bps,
        }
    }
}

impl Default for TierRates {
    fn default() -> Self {
        Self {
            c_bps: 1_000,
            b_bps: 800,
            a_bps: 600,
        }
    }
}

/// Reputation scoring policy
///
/// `score = min(base_score + invoices_cleared * increment, max_score)`;
/// the tier is the highest whose threshold the score reaches.
#[derive(Debug, Clone, PartialEq)]
pub struct ReputationPolicy {
    pub base_score: u32,
    pub increment: u32,
    pub max_score: u32,
    pub tier_b_threshold: u32,
    pub tier_a_threshold: u32,
}

impl ReputationPolicy {
    /// Monotone map from score to tier
    pub fn tier_for(&self, score: u32) -> Tier {
        if score >= self.tier_a_threshold {
            Tier::A
        } else if score >= self.tier_b_threshold {
            Tier::B
        } else {
            Tier::C
        }
    }
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            base_score: 500,
            increment: 50,
            max_score: 1_000,
            tier_b_threshold: 600,
            tier_a_threshold: 800,
        }
    }
}

/// Complete protocol configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolConfig {
    /// Principal holding the Admin role at genesis
    pub admin: Address,

    /// Account receiving protocol fees
    pub treasury: Address,

    /// Protocol fee charged on settlement, in basis points of the payment
    pub fee_bps: u32,

    /// Largest advance as a share of invoice face value, in basis points
    pub max_advance_bps: u32,

    pub tier_rates: TierRates,

    pub reputation: ReputationPolicy,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            admin: Address::from("admin"),
            treasury: Address::from("treasury"),
            fee_bps: 50,
            max_advance_bps: 8_000,
            tier_rates: TierRates::default(),
            reputation: ReputationPolicy::default(),
        }
    }
}

impl ProtocolConfig {
    /// Check internal consistency of the configuration
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.fee_bps > BPS_DENOMINATOR {
            return Err(ProtocolError::invalid_argument(format!(
                "fee_bps {} exceeds {}",
                self.fee_bps, BPS_DENOMINATOR
            )));
        }
        if self.max_advance_bps == 0 || self.max_advance_bps > BPS_DENOMINATOR {
            return Err(ProtocolError::invalid_argument(format!(
                "max_advance_bps must be within 1..={}, got {}",
                BPS_DENOMINATOR, self.max_advance_bps
            )));
        }

        let rates = &self.tier_rates;
        if rates.a_bps > rates.b_bps || rates.b_bps > rates.c_bps {
            return Err(ProtocolError::invalid_argument(
                "tier rates must not increase from tier C to tier A",
            ));
        }

        let policy = &self.reputation;
        if !(policy.base_score <= policy.tier_b_threshold
            && policy.tier_b_threshold <= policy.tier_a_threshold
            && policy.tier_a_threshold <= policy.max_score)
        {
            return Err(ProtocolError::invalid_argument(
                "reputation thresholds must satisfy base <= B <= A <= max",
            ));
        }

        if self.admin == self.treasury {
            return Err(ProtocolError::invalid_argument(
                "admin and treasury must be distinct accounts",
            ));
        }

        Ok(())
    }
}
