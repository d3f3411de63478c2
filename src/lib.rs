//! Invoice Settlement Engine Library
//! # Overview
//!
//! This library replays an invoice-financing operation log. Sellers register
//! invoices, draw advances against them from a pooled liquidity vault, and
//! buyers settle them; each settlement repays the vault, pays the protocol
//! fee and credits the seller's reputation, which in turn lowers the
//! seller's future interest rate.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Invoice, Advance, events, operations, errors)
//! - [`config`] - Protocol parameters and their validation
//! - [`core`] - Business logic components:
//!   - [`core::invoice_registry`] - Invoice records and status machine
//!   - [`core::advance_engine`] - Advance origination
//!   - [`core::vault`] - Pooled liquidity and depositor shares
//!   - [`core::settlement`] - Payment distribution and clearance
//!   - [`core::reputation`] - Seller scores and tiers
//!   - [`core::engine`] - Sequential operation executor
//! - [`io`] - CSV reading (sync and async) and report writing
//! - [`strategy`] - Pluggable reading pipelines
//! - [`cli`] - CLI arguments parsing
//! - [`telemetry`] - Logging setup
//!
//! # Invoice Lifecycle
//!
//! ```text
//! Issued ──advance──▶ Financed ──pay──▶ Paid ──▶ Cleared
//! ```
//!
//! Paid and Cleared are entered in the same settlement. Every operation is
//! atomic: it either commits all of its effects and events or none.

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use config::ProtocolConfig;
pub use core::{SettlementCurrency, SettlementEngine, TokenLedger};
pub use io::{write_events_csv, write_invoices_csv};
pub use types::{
    Address, Advance, EventRecord, Invoice, InvoiceId, InvoiceStatus, Operation,
    OperationRecord, ProtocolError, ProtocolEvent, Role, Tier, Timestamp,
};
