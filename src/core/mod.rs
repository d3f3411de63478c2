//! Core business logic module
//!
//! This module contains the protocol components:
//! - `traits` - Settlement currency abstraction
//! - `token_ledger` - In-memory settlement currency
//! - `access_control` - Role grants checked by every entry point
//! - `invoice_registry` - Invoice records and their status machine
//! - `advance_engine` - Advance origination and the advance book
//! - `vault` - Pooled liquidity and depositor shares
//! - `settlement` - Payment distribution and clearance
//! - `reputation` - Seller scores and tiers
//! - `state` - The ledgers grouped for coordinated mutation
//! - `event_log` - Append-only record of committed events
//! - `engine` - Sequential operation executor

pub mod access_control;
pub mod advance_engine;
pub mod engine;
pub mod event_log;
pub mod invoice_registry;
pub mod reputation;
pub mod settlement;
pub mod state;
pub mod token_ledger;
pub mod traits;
pub mod vault;

pub use access_control::AccessControl;
pub use advance_engine::{AdvanceBook, AdvanceEngine};
pub use engine::SettlementEngine;
pub use event_log::EventLog;
pub use invoice_registry::InvoiceRegistry;
pub use reputation::ReputationLedger;
pub use settlement::{SettlementBreakdown, SettlementReceipt, SettlementRouter};
pub use state::ProtocolState;
pub use token_ledger::TokenLedger;
pub use traits::SettlementCurrency;
pub use vault::Vault;
