use std::collections::{HashMap, HashSet};

use crate::models::PlayerId;

/// Capability a player needs to breed horses.
pub const LICENSED_VET: &str = "husbandry.vet";

/// Role/permission check supplied by the host.
pub trait Permissions {
    fn has_capability(&self, actor: PlayerId, capability: &str) -> bool;
}

/// Static grant table, for hosts without a permission system of their own.
#[derive(Debug, Default, Clone)]
pub struct CapabilityGrants {
    grants: HashMap<PlayerId, HashSet<String>>,
}

impl CapabilityGrants {
    pub fn new() -> Self {
        CapabilityGrants::default()
    }

    pub fn grant(&mut self, actor: PlayerId, capability: &str) {
        self.grants.entry(actor).or_default().insert(capability.to_string());
    }

    pub fn revoke(&mut self, actor: PlayerId, capability: &str) -> bool {
        let removed = self.grants.get_mut(&actor).map_or(false, |caps| caps.remove(capability));
        if self.grants.get(&actor).map_or(false, |caps| caps.is_empty()) {
            self.grants.remove(&actor);
        }
        removed
    }
}

impl Permissions for CapabilityGrants {
    fn has_capability(&self, actor: PlayerId, capability: &str) -> bool {
        self.grants.get(&actor).map_or(false, |caps| caps.contains(capability))
    }
}
