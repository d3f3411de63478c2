//! Capability table
//!
//! Maps `(role, principal)` to granted / not granted. Every mutating entry
//! point in the protocol checks the table before applying any state change.
//! Only principals holding [`Role::Admin`] may modify the table.

use crate::types::{Address, ProtocolError, Role};
use std::collections::HashSet;

/// Process-wide role grants
#[derive(Debug, Clone, PartialEq)]
pub struct AccessControl {
    grants: HashSet<(Role, Address)>,
}

impl AccessControl {
    /// Create a table where `admin` holds the Admin role
    pub fn new(admin: Address) -> Self {
        let mut grants = HashSet::new();
        grants.insert((Role::Admin, admin));
        AccessControl { grants }
    }

    pub fn has_role(&self, role: Role, principal: &Address) -> bool {
        self.grants.contains(&(role, principal.clone()))
    }

    /// Fail with `Unauthorized` unless `principal` holds `role`
    pub fn require(&self, role: Role, principal: &Address) -> Result<(), ProtocolError> {
        if self.has_role(role, principal) {
            Ok(())
        } else {
            Err(ProtocolError::unauthorized(role, principal.as_str()))
        }
    }

    /// Fail with `Unauthorized` unless `principal` holds at least one of `roles`
    ///
    /// The error names the first role in `roles`.
    pub fn require_any(&self, roles: &[Role], principal: &Address) -> Result<(), ProtocolError> {
        if roles.iter().any(|role| self.has_role(*role, principal)) {
            return Ok(());
        }
        let reported = roles.first().copied().unwrap_or(Role::Admin);
        Err(ProtocolError::unauthorized(reported, principal.as_str()))
    }

    /// Grant `role` to `principal`; `caller` must be an admin
    ///
    /// Returns whether the table changed.
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        principal: &Address,
    ) -> Result<bool, ProtocolError> {
        self.require(Role::Admin, caller)?;
        Ok(self.grants.insert((role, principal.clone())))
    }

    /// Revoke `role` from `principal`; `caller` must be an admin
    ///
    /// Returns whether the table changed.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        principal: &Address,
    ) -> Result<bool, ProtocolError> {
        self.require(Role::Admin, caller)?;
        Ok(self.grants.remove(&(role, principal.clone())))
    }

    /// Genesis-time grant that bypasses the admin check
    pub(crate) fn bootstrap(&mut self, role: Role, principal: &Address) {
        self.grants.insert((role, principal.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn acl() -> AccessControl {
        AccessControl::new(Address::from("admin"))
    }

    #[test]
    fn test_admin_holds_admin_role_at_genesis() {
        let acl = acl();
        assert!(acl.has_role(Role::Admin, &Address::from("admin")));
        assert!(!acl.has_role(Role::Issuer, &Address::from("admin")));
    }

    #[test]
    fn test_grant_and_revoke_round_trip() {
        let mut acl = acl();
        let admin = Address::from("admin");
        let alice = Address::from("alice");

        assert_eq!(acl.grant_role(&admin, Role::Issuer, &alice), Ok(true));
        assert!(acl.has_role(Role::Issuer, &alice));
        assert_eq!(acl.grant_role(&admin, Role::Issuer, &alice), Ok(false));

        assert_eq!(acl.revoke_role(&admin, Role::Issuer, &alice), Ok(true));
        assert!(!acl.has_role(Role::Issuer, &alice));
        assert_eq!(acl.revoke_role(&admin, Role::Issuer, &alice), Ok(false));
    }

    #[rstest]
    #[case::grant(true)]
    #[case::revoke(false)]
    fn test_non_admin_cannot_modify_table(#[case] grant: bool) {
        let mut acl = acl();
        let before = acl.clone();
        let mallory = Address::from("mallory");

        let result = if grant {
            acl.grant_role(&mallory, Role::Admin, &mallory)
        } else {
            acl.revoke_role(&mallory, Role::Admin, &Address::from("admin"))
        };

        assert_eq!(result, Err(ProtocolError::unauthorized(Role::Admin, "mallory")));
        assert_eq!(acl, before);
    }

    #[test]
    fn test_require_any_accepts_either_role() {
        let mut acl = acl();
        let router = Address::from("router");
        acl.bootstrap(Role::Settlement, &router);

        assert!(acl
            .require_any(&[Role::Borrower, Role::Settlement], &router)
            .is_ok());
        assert_eq!(
            acl.require_any(&[Role::Borrower, Role::Settlement], &Address::from("x")),
            Err(ProtocolError::unauthorized(Role::Borrower, "x"))
        );
    }
}
