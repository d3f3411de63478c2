//! Seller reputation ledger
//!
//! Scores only ever move up, one step per cleared invoice, and only the
//! settlement router (Settlement capability) can move them. Unknown sellers
//! read as the baseline score and tier C.

use crate::config::ReputationPolicy;
use crate::core::access_control::AccessControl;
use crate::types::{
    Address, ProtocolError, ReputationRecord, ReputationStats, Role, Tier, Timestamp,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ReputationLedger {
    records: HashMap<Address, ReputationRecord>,
    policy: ReputationPolicy,
}

impl ReputationLedger {
    pub fn new(policy: ReputationPolicy) -> Self {
        ReputationLedger {
            records: HashMap::new(),
            policy,
        }
    }

    pub fn score(&self, seller: &Address) -> u32 {
        self.records
            .get(seller)
            .map(|record| record.score)
            .unwrap_or(self.policy.base_score)
    }

    pub fn tier(&self, seller: &Address) -> Tier {
        self.records
            .get(seller)
            .map(|record| record.tier)
            .unwrap_or_else(|| self.policy.tier_for(self.policy.base_score))
    }

    pub fn stats(&self, seller: &Address) -> ReputationStats {
        match self.records.get(seller) {
            Some(record) => ReputationStats {
                invoices_cleared: record.invoices_cleared,
                total_volume: record.total_volume,
                last_updated: record.last_updated,
            },
            None => ReputationStats {
                invoices_cleared: 0,
                total_volume: Decimal::ZERO,
                last_updated: 0,
            },
        }
    }

    /// The record `update_reputation` would store, without storing it
    pub fn preview_update(
        &self,
        seller: &Address,
        amount: Decimal,
        now: Timestamp,
    ) -> Result<ReputationRecord, ProtocolError> {
        let (cleared, volume) = match self.records.get(seller) {
            Some(record) => (record.invoices_cleared, record.total_volume),
            None => (0, Decimal::ZERO),
        };

        let invoices_cleared = cleared
            .checked_add(1)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("invoices cleared"))?;
        let total_volume = volume
            .checked_add(amount)
            .ok_or_else(|| ProtocolError::arithmetic_overflow("total volume"))?;

        let score = self.score_for(invoices_cleared);

        Ok(ReputationRecord {
            seller: seller.clone(),
            score,
            tier: self.policy.tier_for(score),
            invoices_cleared,
            total_volume,
            last_updated: now,
        })
    }

    /// Record one cleared invoice of `amount` for `seller`
    ///
    /// Requires the Settlement role. Returns the updated record.
    pub fn update_reputation(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        seller: &Address,
        amount: Decimal,
        now: Timestamp,
    ) -> Result<ReputationRecord, ProtocolError> {
        acl.require(Role::Settlement, caller)?;
        let record = self.preview_update(seller, amount, now)?;
        self.records.insert(seller.clone(), record.clone());
        Ok(record)
    }

    /// `min(base + cleared * increment, max)` with saturating arithmetic
    fn score_for(&self, invoices_cleared: u64) -> u32 {
        let policy = &self.policy;
        let bonus = u64::from(policy.increment).saturating_mul(invoices_cleared);
        let raw = u64::from(policy.base_score).saturating_add(bonus);
        raw.min(u64::from(policy.max_score)) as u32
    }
}
