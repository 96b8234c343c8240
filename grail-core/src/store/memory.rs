use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{AccountStore, RosterSource};
use crate::account::GrailAccount;
use crate::address::Address;
use crate::error::StoreError;
use crate::party::PartyRoster;

/// In-process store. A single lock covers each map, so guarded updates are
/// trivially atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Mutex<BTreeMap<Address, GrailAccount>>,
    rosters: Mutex<BTreeMap<Address, PartyRoster>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RosterSource for MemoryStore {
    fn roster_for(&self, leader: &Address) -> Result<Option<PartyRoster>, StoreError> {
        let rosters = self.rosters.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rosters.get(leader).cloned())
    }
}

impl AccountStore for MemoryStore {
    fn insert(&self, account: GrailAccount) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().map_err(|_| StoreError::Poisoned)?;
        if accounts.contains_key(&account.address) {
            return Err(StoreError::Duplicate(account.address));
        }
        accounts.insert(account.address.clone(), account);
        Ok(())
    }

    fn find(&self, address: &Address) -> Result<Option<GrailAccount>, StoreError> {
        let accounts = self.accounts.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(accounts.get(address).cloned())
    }

    fn find_and_modify<G, U>(
        &self,
        address: &Address,
        guard: G,
        update: U,
    ) -> Result<Option<GrailAccount>, StoreError>
    where
        G: FnOnce(&GrailAccount) -> bool,
        U: FnOnce(&mut GrailAccount),
    {
        let mut accounts = self.accounts.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(account) = accounts.get_mut(address) else {
            return Ok(None);
        };
        if !guard(account) {
            return Ok(None);
        }
        update(account);
        Ok(Some(account.clone()))
    }

    fn all(&self) -> Result<Vec<GrailAccount>, StoreError> {
        let accounts = self.accounts.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(accounts.values().cloned().collect())
    }

    fn insert_roster(&self, roster: PartyRoster) -> Result<(), StoreError> {
        let mut rosters = self.rosters.lock().map_err(|_| StoreError::Poisoned)?;
        if rosters.contains_key(&roster.leader) {
            return Err(StoreError::Duplicate(roster.leader));
        }
        rosters.insert(roster.leader.clone(), roster);
        Ok(())
    }

    fn modify_roster<F>(&self, leader: &Address, edit: F) -> Result<Option<bool>, StoreError>
    where
        F: FnOnce(&mut PartyRoster) -> bool,
    {
        let mut rosters = self.rosters.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rosters.get_mut(leader).map(edit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::account;
    use crate::token::Token;

    #[test]
    fn insert_rejects_duplicates() {
        let store = MemoryStore::new();
        store.insert(account("bob")).unwrap();
        assert!(matches!(
            store.insert(account("BOB")),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn guarded_update_only_applies_on_match() {
        let store = MemoryStore::new();
        store.insert(account("bob")).unwrap();
        let bob = Address::new("bob");

        let rejected = store
            .find_and_modify(&bob, |a| a.token.as_str() == "nope", |a| a.update_count = 9)
            .unwrap();
        assert!(rejected.is_none());
        assert_eq!(store.find(&bob).unwrap().unwrap().update_count, 0);

        let applied = store
            .find_and_modify(
                &bob,
                |a| a.token.as_str() == "t0",
                |a| a.token = Token::from("t1"),
            )
            .unwrap()
            .unwrap();
        assert_eq!(applied.token, Token::from("t1"));
        assert!(
            store
                .find_and_modify(&Address::new("ghost"), |_| true, |_| {})
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn rosters_persist_edits() {
        let store = MemoryStore::new();
        let lead = Address::new("lead");
        store.insert_roster(PartyRoster::new(lead.clone())).unwrap();
        let changed = store
            .modify_roster(&lead, |r| r.add_member(Address::new("bob")))
            .unwrap();
        assert_eq!(changed, Some(true));
        assert_eq!(store.roster_for(&lead).unwrap().unwrap().len(), 2);
        assert_eq!(
            store.modify_roster(&Address::new("nobody"), |_| true).unwrap(),
            None
        );
    }
}
