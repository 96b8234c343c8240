//! Stored grail accounts and their public views.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::catalog::{GrailMode, ItemPath};
use crate::error::GrailError;
use crate::password::PasswordDigest;
use crate::record::ItemRecord;
use crate::token::Token;
use crate::tree::PlayerTree;

/// One checklist per mode. `None` means the player never saved that mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrailTrees {
    #[serde(default, rename = "data", skip_serializing_if = "Option::is_none")]
    pub holy: Option<PlayerTree>,
    #[serde(default, rename = "ethData", skip_serializing_if = "Option::is_none")]
    pub eth: Option<PlayerTree>,
    #[serde(default, rename = "runewordData", skip_serializing_if = "Option::is_none")]
    pub runeword: Option<PlayerTree>,
}

impl GrailTrees {
    #[must_use]
    pub const fn get(&self, mode: GrailMode) -> Option<&PlayerTree> {
        match mode {
            GrailMode::Holy => self.holy.as_ref(),
            GrailMode::Eth => self.eth.as_ref(),
            GrailMode::Runeword => self.runeword.as_ref(),
        }
    }

    pub const fn slot_mut(&mut self, mode: GrailMode) -> &mut Option<PlayerTree> {
        match mode {
            GrailMode::Holy => &mut self.holy,
            GrailMode::Eth => &mut self.eth,
            GrailMode::Runeword => &mut self.runeword,
        }
    }

    /// Tree for `mode`, created empty on first edit.
    pub fn get_or_create(&mut self, mode: GrailMode) -> &mut PlayerTree {
        self.slot_mut(mode).get_or_insert_with(PlayerTree::new)
    }

    pub fn set(&mut self, mode: GrailMode, tree: Option<PlayerTree>) {
        *self.slot_mut(mode) = tree;
    }
}

/// Persisted account document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrailAccount {
    pub address: Address,
    pub password: PasswordDigest,
    pub token: Token,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub update_count: u64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub trees: GrailTrees,
    #[serde(default)]
    pub settings: Value,
}

impl GrailAccount {
    /// Public projection. The password digest never leaves the store layer.
    #[must_use]
    pub fn view(&self) -> AccountView {
        AccountView {
            address: self.address.clone(),
            token: self.token.clone(),
            version: self.version.clone(),
            trees: self.trees.clone(),
            settings: self.settings.clone(),
            update_count: self.update_count,
            modified_at: self.modified_at,
            read_only: false,
            has_party: false,
        }
    }
}

/// What clients see of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub address: Address,
    pub token: Token,
    pub version: Option<String>,
    #[serde(flatten)]
    pub trees: GrailTrees,
    pub settings: Value,
    pub update_count: u64,
    pub modified_at: DateTime<Utc>,
    pub read_only: bool,
    pub has_party: bool,
}

/// Checklist content copied into a new account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTemplate {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub trees: GrailTrees,
    #[serde(default)]
    pub settings: Value,
}

/// Account creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub address: String,
    pub password: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub template: Option<AccountTemplate>,
}

impl NewAccount {
    #[must_use]
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            version: None,
            template: None,
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: AccountTemplate) -> Self {
        self.template = Some(template);
        self
    }
}

/// Content changes accepted by a guarded update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrailPatch {
    /// Replace whole checklists. The holy grail tree is required.
    Trees {
        version: Option<String>,
        holy: Option<PlayerTree>,
        eth: Option<PlayerTree>,
        runeword: Option<PlayerTree>,
    },
    /// Replace the opaque settings blob.
    Settings(Option<Value>),
    /// Edit a single item slot.
    Item {
        mode: GrailMode,
        path: ItemPath,
        record: ItemRecord,
    },
}

impl GrailPatch {
    /// Reject patches that are missing a required field.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::Validation`] naming the missing field.
    pub fn validate(&self) -> Result<(), GrailError> {
        match self {
            Self::Trees { holy: None, .. } => Err(GrailError::Validation { field: "grail" }),
            Self::Settings(None) => Err(GrailError::Validation { field: "settings" }),
            Self::Item { path, .. } if path.is_empty() => {
                Err(GrailError::Validation { field: "path" })
            }
            _ => Ok(()),
        }
    }

    /// Apply to an account. Call [`GrailPatch::validate`] first.
    pub fn apply(self, account: &mut GrailAccount) {
        match self {
            Self::Trees {
                version,
                holy,
                eth,
                runeword,
            } => {
                account.version = version;
                account.trees.set(GrailMode::Holy, holy);
                account.trees.set(GrailMode::Eth, eth);
                account.trees.set(GrailMode::Runeword, runeword);
            }
            Self::Settings(settings) => {
                account.settings = settings.unwrap_or_default();
            }
            Self::Item { mode, path, record } => {
                account.trees.get_or_create(mode).set(path, record);
            }
        }
    }
}
