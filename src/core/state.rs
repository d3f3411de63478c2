//! Protocol state
//!
//! Every ledger the engine mutates, grouped so that orchestrating operations
//! can borrow the components they coordinate side by side. Each field is
//! mutated only through its own component's entry points.

use crate::config::ProtocolConfig;
use crate::core::access_control::AccessControl;
use crate::core::advance_engine::AdvanceBook;
use crate::core::invoice_registry::InvoiceRegistry;
use crate::core::reputation::ReputationLedger;
use crate::core::traits::SettlementCurrency;
use crate::core::vault::Vault;
use crate::types::Address;

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolState<C: SettlementCurrency> {
    pub(crate) config: ProtocolConfig,
    pub(crate) access: AccessControl,
    pub(crate) currency: C,
    pub(crate) registry: InvoiceRegistry,
    pub(crate) advances: AdvanceBook,
    pub(crate) vault: Vault,
    pub(crate) reputation: ReputationLedger,
}

impl<C: SettlementCurrency> ProtocolState<C> {
    /// Empty ledgers around `currency`, with the configured admin
    pub fn new(config: ProtocolConfig, currency: C, vault_account: Address) -> Self {
        ProtocolState {
            access: AccessControl::new(config.admin.clone()),
            currency,
            registry: InvoiceRegistry::new(),
            advances: AdvanceBook::new(),
            vault: Vault::new(vault_account),
            reputation: ReputationLedger::new(config.reputation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn currency(&self) -> &C {
        &self.currency
    }

    pub fn registry(&self) -> &InvoiceRegistry {
        &self.registry
    }

    pub fn advances(&self) -> &AdvanceBook {
        &self.advances
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn reputation(&self) -> &ReputationLedger {
        &self.reputation
    }
}
