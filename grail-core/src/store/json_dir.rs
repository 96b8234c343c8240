use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{AccountStore, RosterSource};
use crate::account::GrailAccount;
use crate::address::Address;
use crate::error::StoreError;
use crate::party::PartyRoster;
use crate::password::to_hex;

const ACCOUNTS_DIR: &str = "accounts";
const PARTIES_DIR: &str = "parties";

/// One pretty-printed JSON document per account under `<root>/accounts`, and
/// one per roster under `<root>/parties`. File names are the SHA-256 of the
/// normalized address.
///
/// Writes go to a temp file that is renamed over the document. Guarded updates
/// are serialized by an in-process lock, so a directory must not be shared by
/// two live processes.
#[derive(Debug)]
pub struct JsonDirStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonDirStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(ACCOUNTS_DIR))?;
        fs::create_dir_all(root.join(PARTIES_DIR))?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, dir: &str, address: &Address) -> PathBuf {
        let name = to_hex(&Sha256::digest(address.as_str().as_bytes()));
        self.root.join(dir).join(format!("{name}.json"))
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl RosterSource for JsonDirStore {
    fn roster_for(&self, leader: &Address) -> Result<Option<PartyRoster>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        read_document(&self.document_path(PARTIES_DIR, leader))
    }
}

impl AccountStore for JsonDirStore {
    fn insert(&self, account: GrailAccount) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.document_path(ACCOUNTS_DIR, &account.address);
        if path.exists() {
            return Err(StoreError::Duplicate(account.address));
        }
        write_document(&path, &account)
    }

    fn find(&self, address: &Address) -> Result<Option<GrailAccount>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        read_document(&self.document_path(ACCOUNTS_DIR, address))
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
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.document_path(ACCOUNTS_DIR, address);
        let Some(mut account) = read_document::<GrailAccount>(&path)? else {
            return Ok(None);
        };
        if !guard(&account) {
            return Ok(None);
        }
        update(&mut account);
        write_document(&path, &account)?;
        Ok(Some(account))
    }

    fn all(&self) -> Result<Vec<GrailAccount>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut accounts = Vec::new();
        for entry in fs::read_dir(self.root.join(ACCOUNTS_DIR))? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(account) = read_document::<GrailAccount>(&path)? {
                    accounts.push(account);
                }
            }
        }
        accounts.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(accounts)
    }

    fn insert_roster(&self, roster: PartyRoster) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.document_path(PARTIES_DIR, &roster.leader);
        if path.exists() {
            return Err(StoreError::Duplicate(roster.leader));
        }
        write_document(&path, &roster)
    }

    fn modify_roster<F>(&self, leader: &Address, edit: F) -> Result<Option<bool>, StoreError>
    where
        F: FnOnce(&mut PartyRoster) -> bool,
    {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.document_path(PARTIES_DIR, leader);
        let Some(mut roster) = read_document::<PartyRoster>(&path)? else {
            return Ok(None);
        };
        let changed = edit(&mut roster);
        if changed {
            write_document(&path, &roster)?;
        }
        Ok(Some(changed))
    }
}
