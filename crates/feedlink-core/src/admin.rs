//! Admin registry
//!
//! Tracks the set of privileged principals. Only an existing admin may change
//! membership, and an admin can never remove itself, so self-service can
//! never empty the registry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::events::Notification;
use crate::models::Principal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRegistry {
    admins: BTreeSet<Principal>,
}

impl AdminRegistry {
    /// Seed the registry with the principal performing initialization
    pub fn new(seed: Principal) -> LedgerResult<Self> {
        if seed.is_null() {
            return Err(LedgerError::InvalidTarget);
        }
        Ok(Self {
            admins: BTreeSet::from([seed]),
        })
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.admins.contains(principal)
    }

    /// Fail with `Unauthorized` unless `caller` is an admin
    pub fn require_admin(&self, caller: &Principal) -> LedgerResult<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(caller.clone()))
        }
    }

    pub fn add_admin(&mut self, caller: &Principal, target: Principal) -> LedgerResult<Notification> {
        self.require_admin(caller)?;
        if target.is_null() {
            return Err(LedgerError::InvalidTarget);
        }
        if self.is_admin(&target) {
            return Err(LedgerError::AlreadyAdmin(target));
        }

        self.admins.insert(target.clone());
        Ok(Notification::AdminAdded { admin: target })
    }

    pub fn remove_admin(
        &mut self,
        caller: &Principal,
        target: &Principal,
    ) -> LedgerResult<Notification> {
        self.require_admin(caller)?;
        if target.is_null() {
            return Err(LedgerError::InvalidTarget);
        }
        if !self.is_admin(target) {
            return Err(LedgerError::NotAdmin(target.clone()));
        }
        if target == caller {
            return Err(LedgerError::SelfRemoval);
        }

        self.admins.remove(target);
        Ok(Notification::AdminRemoved {
            admin: target.clone(),
        })
    }

    /// All admins, sorted
    pub fn admins(&self) -> Vec<Principal> {
        self.admins.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Principal {
        Principal::new(s)
    }

    fn registry() -> AdminRegistry {
        AdminRegistry::new(p("root")).unwrap()
    }

    #[test]
    fn test_seed_is_admin() {
        let reg = registry();
        assert!(reg.is_admin(&p("root")));
        assert!(!reg.is_admin(&p("alice")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_null_seed_rejected() {
        assert!(matches!(
            AdminRegistry::new(Principal::null()),
            Err(LedgerError::InvalidTarget)
        ));
    }

    #[test]
    fn test_add_admin() {
        let mut reg = registry();
        let n = reg.add_admin(&p("root"), p("alice")).unwrap();
        assert_eq!(n, Notification::AdminAdded { admin: p("alice") });
        assert!(reg.is_admin(&p("alice")));
    }

    #[test]
    fn test_add_admin_failures() {
        let mut reg = registry();

        assert!(matches!(
            reg.add_admin(&p("eve"), p("mallory")),
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(matches!(
            reg.add_admin(&p("root"), Principal::null()),
            Err(LedgerError::InvalidTarget)
        ));
        assert!(matches!(
            reg.add_admin(&p("root"), p("root")),
            Err(LedgerError::AlreadyAdmin(_))
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unauthorized_checked_before_target() {
        let mut reg = registry();
        assert!(matches!(
            reg.add_admin(&p("eve"), Principal::null()),
            Err(LedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_remove_admin() {
        let mut reg = registry();
        reg.add_admin(&p("root"), p("alice")).unwrap();

        let n = reg.remove_admin(&p("root"), &p("alice")).unwrap();
        assert_eq!(n, Notification::AdminRemoved { admin: p("alice") });
        assert!(!reg.is_admin(&p("alice")));
    }

    #[test]
    fn test_remove_admin_failures() {
        let mut reg = registry();

        assert!(matches!(
            reg.remove_admin(&p("eve"), &p("root")),
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(matches!(
            reg.remove_admin(&p("root"), &Principal::null()),
            Err(LedgerError::InvalidTarget)
        ));
        assert!(matches!(
            reg.remove_admin(&p("root"), &p("alice")),
            Err(LedgerError::NotAdmin(_))
        ));
    }

    #[test]
    fn test_self_removal_regardless_of_size() {
        let mut reg = registry();
        assert!(matches!(
            reg.remove_admin(&p("root"), &p("root")),
            Err(LedgerError::SelfRemoval)
        ));

        reg.add_admin(&p("root"), p("alice")).unwrap();
        reg.add_admin(&p("root"), p("bob")).unwrap();
        assert!(matches!(
            reg.remove_admin(&p("alice"), &p("alice")),
            Err(LedgerError::SelfRemoval)
        ));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_mutual_removal_is_allowed() {
        let mut reg = registry();
        reg.add_admin(&p("root"), p("alice")).unwrap();
        reg.remove_admin(&p("alice"), &p("root")).unwrap();
        assert_eq!(reg.admins(), vec![p("alice")]);
    }
}
