//! Party rosters.
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A leader and the accounts whose checklists are pooled into the party view.
///
/// Members keep insertion order; the order decides how merged notes read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRoster {
    pub leader: Address,
    #[serde(default)]
    members: Vec<Address>,
}

impl PartyRoster {
    /// New roster with the leader as its first member.
    #[must_use]
    pub fn new(leader: Address) -> Self {
        Self {
            members: vec![leader.clone()],
            leader,
        }
    }

    #[must_use]
    pub fn members(&self) -> &[Address] {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Append a member; returns `false` if already present.
    pub fn add_member(&mut self, address: Address) -> bool {
        if self.contains(&address) {
            return false;
        }
        self.members.push(address);
        true
    }

    /// Remove a member; returns `false` if absent.
    pub fn remove_member(&mut self, address: &Address) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member != address);
        before != self.members.len()
    }
}
