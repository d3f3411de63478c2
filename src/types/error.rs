//! Error types for the invoice settlement engine
//!
//! This module defines all error types that can occur while executing protocol
//! operations or reading the operation log.
//!
//! # Error Categories
//!
//! - **Protocol Errors**: missing capability, invalid entity state, malformed
//!   arguments, unknown ids, liquidity or payment shortfalls, duplicates
//! - **Currency Errors**: a settlement currency transfer would overdraw an account
//! - **Arithmetic Errors**: overflow while computing balances or interest
//! - **File I/O and CSV Errors**: missing input file, malformed rows
//!
//! Every protocol error aborts the whole operation; no partial effect survives.

use crate::types::role::Role;
use rust_decimal::Decimal;
use std::path::Path;
use thiserror::Error;

/// Main error type for the settlement engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// The caller does not hold the capability the operation requires
    #[error("Principal '{principal}' lacks the {role} role")]
    Unauthorized {
        /// The required role
        role: Role,
        /// The principal that attempted the call
        principal: String,
    },

    /// The operation is not valid for the entity's current status
    #[error("Invalid state for {entity} {id}: {message}")]
    InvalidState {
        /// Entity kind (invoice, advance)
        entity: &'static str,
        /// Entity identifier
        id: u64,
        /// What was wrong with the state
        message: String,
    },

    /// Malformed input: zero amount, past due date, mismatched payment, ...
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// Unknown entity id
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (invoice, advance)
        entity: &'static str,
        /// The id that was looked up
        id: u64,
    },

    /// The vault cannot satisfy a borrow or withdrawal
    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity {
        /// Amount requested from the vault
        requested: Decimal,
        /// Liquidity not currently lent out
        available: Decimal,
    },

    /// The settlement amount does not cover repayment plus fee
    #[error("Insufficient payment: required {required}, provided {provided}")]
    InsufficientPayment {
        /// Vault repayment plus protocol fee
        required: Decimal,
        /// Amount offered by the payer
        provided: Decimal,
    },

    /// A record with the same key already exists
    #[error("{entity} {id} already exists")]
    AlreadyExists {
        /// Entity kind (advance, ownership token)
        entity: &'static str,
        /// The duplicated id
        id: u64,
    },

    /// A settlement currency transfer would overdraw the source account
    #[error("Insufficient funds for '{account}': balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account being debited
        account: String,
        /// Its current balance
        balance: Decimal,
        /// Amount to debit
        requested: Decimal,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for ProtocolError {
    fn from(error: std::io::Error) -> Self {
        ProtocolError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ProtocolError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        ProtocolError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl ProtocolError {
    /// Create an Unauthorized error
    pub fn unauthorized(role: Role, principal: &str) -> Self {
        ProtocolError::Unauthorized {
            role,
            principal: principal.to_string(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(entity: &'static str, id: u64, message: impl Into<String>) -> Self {
        ProtocolError::InvalidState {
            entity,
            id,
            message: message.into(),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ProtocolError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        ProtocolError::NotFound { entity, id }
    }

    /// Create an InsufficientLiquidity error
    pub fn insufficient_liquidity(requested: Decimal, available: Decimal) -> Self {
        ProtocolError::InsufficientLiquidity {
            requested,
            available,
        }
    }

    /// Create an InsufficientPayment error
    pub fn insufficient_payment(required: Decimal, provided: Decimal) -> Self {
        ProtocolError::InsufficientPayment { required, provided }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(entity: &'static str, id: u64) -> Self {
        ProtocolError::AlreadyExists { entity, id }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: &str, balance: Decimal, requested: Decimal) -> Self {
        ProtocolError::InsufficientFunds {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        ProtocolError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Classify a failure to open `path` as FileNotFound or IoError
    pub fn open_failed(path: &Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            ProtocolError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            ProtocolError::IoError {
                message: format!("Failed to open '{}': {}", path.display(), error),
            }
        }
    }
}
