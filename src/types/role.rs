//! Capability roles
//!
//! Roles form a closed set so a misspelled capability is a compile error
//! inside the crate and a parse error at the operation-log boundary.

use std::fmt;
use std::str::FromStr;

/// Named permission a principal must hold to invoke a mutating operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Grants and revokes roles, adjusts the protocol fee, funds accounts
    Admin,
    /// May register invoices (the minter of invoice ownership tokens)
    Issuer,
    /// May move invoices from Issued to Financed
    AdvanceEngine,
    /// May borrow from and repay the vault
    Borrower,
    /// May mark invoices paid/cleared, advances repaid, and update reputation
    Settlement,
}

impl Role {
    /// Canonical lowercase name used in logs and the operation log
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Issuer => "issuer",
            Role::AdvanceEngine => "advance_engine",
            Role::Borrower => "borrower",
            Role::Settlement => "settlement",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "issuer" | "minter" => Ok(Role::Issuer),
            "advance_engine" => Ok(Role::AdvanceEngine),
            "borrower" => Ok(Role::Borrower),
            "settlement" => Ok(Role::Settlement),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}
