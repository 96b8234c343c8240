//! Persistence seams for accounts and party rosters.
//!
//! Every store must apply [`AccountStore::find_and_modify`] atomically: the
//! guard and the update observe the same document, and no other write to that
//! address can interleave between them.
mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

use crate::account::GrailAccount;
use crate::address::Address;
use crate::error::StoreError;
use crate::party::PartyRoster;

/// Resolves a party leader to the roster of accounts pooled under them.
pub trait RosterSource {
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn roster_for(&self, leader: &Address) -> Result<Option<PartyRoster>, StoreError>;
}

/// Document store for grail accounts.
pub trait AccountStore: RosterSource + Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the address is taken.
    fn insert(&self, account: GrailAccount) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn find(&self, address: &Address) -> Result<Option<GrailAccount>, StoreError>;

    /// Apply `update` to the account at `address` only if `guard` accepts the
    /// current document. Returns the updated account, or `None` when the
    /// account is absent or the guard rejected it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or written.
    fn find_and_modify<G, U>(
        &self,
        address: &Address,
        guard: G,
        update: U,
    ) -> Result<Option<GrailAccount>, StoreError>
    where
        G: FnOnce(&GrailAccount) -> bool,
        U: FnOnce(&mut GrailAccount);

    /// Every stored account, ordered by address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn all(&self) -> Result<Vec<GrailAccount>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the leader already has a roster.
    fn insert_roster(&self, roster: PartyRoster) -> Result<(), StoreError>;

    /// Edit a roster in place. `edit` returns whether anything changed; only
    /// changed rosters are written back. Returns `None` when the leader has no
    /// roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or written.
    fn modify_roster<F>(&self, leader: &Address, edit: F) -> Result<Option<bool>, StoreError>
    where
        F: FnOnce(&mut PartyRoster) -> bool;
}
