//! Grail Tracker Core
//!
//! Account store, item catalogs and party aggregation for a holy grail
//! checklist tracker. This crate holds every rule of the tracker without any
//! transport or UI; front ends drive it through [`GrailEngine`].

pub mod account;
pub mod address;
pub mod aggregate;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod party;
pub mod password;
pub mod recognize;
pub mod record;
pub mod scores;
pub mod site;
pub mod stats;
pub mod store;
pub mod token;
pub mod tree;

// Re-export commonly used types
pub use account::{AccountTemplate, AccountView, GrailAccount, GrailPatch, GrailTrees, NewAccount};
pub use address::Address;
pub use aggregate::{PartyAggregator, PartyView, aggregate, merge_into};
pub use catalog::{
    Catalog, CatalogError, CatalogLoader, CatalogNode, CategoryDef, GrailMode, ItemPath,
    StaticCatalogs,
};
pub use config::{ConfigError, GrailConfig};
pub use error::{GrailError, StoreError};
pub use leaderboard::{Leaderboard, LeaderboardRow, SortKey};
pub use party::PartyRoster;
pub use record::{ItemRecord, NOTE_DELIMITER};
pub use scores::{COMPLETION_SCORE_TARGET, ScoreTable};
pub use site::{ModifiedStat, SiteStatistics};
pub use stats::{CategoryProgress, CategoryStats, GrailStats};
pub use store::{AccountStore, JsonDirStore, MemoryStore, RosterSource};
pub use token::{RandomTokens, Token, TokenSource};
pub use tree::PlayerTree;

use chrono::{DateTime, Utc};

use crate::password::PasswordDigest;

/// One value per checklist mode.
#[derive(Debug, Clone)]
struct PerMode<T> {
    holy: T,
    eth: T,
    runeword: T,
}

impl<T> PerMode<T> {
    fn try_build<E>(mut f: impl FnMut(GrailMode) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            holy: f(GrailMode::Holy)?,
            eth: f(GrailMode::Eth)?,
            runeword: f(GrailMode::Runeword)?,
        })
    }

    const fn get(&self, mode: GrailMode) -> &T {
        match mode {
            GrailMode::Holy => &self.holy,
            GrailMode::Eth => &self.eth,
            GrailMode::Runeword => &self.runeword,
        }
    }
}

/// Main engine for managing grail accounts and parties
pub struct GrailEngine<S, T = RandomTokens>
where
    S: AccountStore,
    T: TokenSource,
{
    store: S,
    tokens: T,
    config: GrailConfig,
    catalogs: PerMode<Catalog>,
    scores: PerMode<ScoreTable>,
}

impl<S> GrailEngine<S>
where
    S: AccountStore,
{
    /// Create an engine backed by `store` using the bundled catalogs and
    /// score tables.
    pub fn new(store: S, config: GrailConfig) -> Self {
        let catalogs = PerMode {
            holy: catalog::catalog(GrailMode::Holy).clone(),
            eth: catalog::catalog(GrailMode::Eth).clone(),
            runeword: catalog::catalog(GrailMode::Runeword).clone(),
        };
        let scores = PerMode {
            holy: scores::score_table(GrailMode::Holy).clone(),
            eth: scores::score_table(GrailMode::Eth).clone(),
            runeword: scores::score_table(GrailMode::Runeword).clone(),
        };
        Self::from_parts(store, RandomTokens, config, catalogs, scores)
    }

    /// Create an engine whose catalogs and score tables both come from
    /// `loader`.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if any mode's catalog or score table cannot
    /// be loaded.
    pub fn with_loader<L>(store: S, config: GrailConfig, loader: &L) -> Result<Self, L::Error>
    where
        L: CatalogLoader,
    {
        let catalogs = PerMode::try_build(|mode| loader.load_catalog(mode))?;
        let scores = PerMode::try_build(|mode| loader.load_scores(mode))?;
        Ok(Self::from_parts(store, RandomTokens, config, catalogs, scores))
    }
}

impl<S, T> GrailEngine<S, T>
where
    S: AccountStore,
    T: TokenSource,
{
    fn from_parts(
        store: S,
        tokens: T,
        config: GrailConfig,
        catalogs: PerMode<Catalog>,
        scores: PerMode<ScoreTable>,
    ) -> Self {
        Self {
            store,
            tokens,
            config,
            catalogs,
            scores,
        }
    }

    /// Swap the token source, e.g. for a deterministic sequence in tests.
    pub fn with_tokens<U: TokenSource>(self, tokens: U) -> GrailEngine<S, U> {
        GrailEngine {
            store: self.store,
            tokens,
            config: self.config,
            catalogs: self.catalogs,
            scores: self.scores,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &GrailConfig {
        &self.config
    }

    pub const fn catalog(&self, mode: GrailMode) -> &Catalog {
        self.catalogs.get(mode)
    }

    pub const fn scores(&self, mode: GrailMode) -> &ScoreTable {
        self.scores.get(mode)
    }

    /// Create an account. Trees come from the template when one is supplied
    /// and are otherwise left unsaved.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::Validation`] for an empty address or password and
    /// [`GrailError::DuplicateKey`] when the address is taken.
    pub fn create_account(&self, request: NewAccount) -> Result<AccountView, GrailError> {
        let address = Address::new(&request.address);
        if address.is_empty() {
            return Err(GrailError::Validation { field: "address" });
        }
        if request.password.is_empty() {
            return Err(GrailError::Validation { field: "password" });
        }
        let template = request.template.unwrap_or_default();
        let now = Utc::now();
        let account = GrailAccount {
            address,
            password: PasswordDigest::create(&request.password),
            token: self.tokens.next_token(),
            created_at: now,
            modified_at: now,
            update_count: 0,
            version: request.version.or(template.version),
            trees: template.trees,
            settings: template.settings,
        };
        let view = account.view();
        self.store.insert(account)?;
        log::info!("created grail for {}", view.address);
        Ok(view)
    }

    fn find(&self, address: &Address) -> Result<GrailAccount, GrailError> {
        self.store
            .find(address)?
            .ok_or_else(|| GrailError::NotFound {
                address: address.clone(),
            })
    }

    /// Public view of an account. `has_party` is set when the account leads a
    /// party.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] for unknown addresses.
    pub fn get(&self, address: &str) -> Result<AccountView, GrailError> {
        let address = Address::new(address);
        let mut view = self.find(&address)?.view();
        view.has_party = self.store.roster_for(&address)?.is_some();
        Ok(view)
    }

    /// Guarded read-modify-write.
    ///
    /// The mutation runs only if the password verifies and `token` still
    /// equals the stored token; the token is rotated in the same atomic step.
    /// A rejected write is classified by re-reading the account.
    ///
    /// # Errors
    ///
    /// [`GrailError::NotFound`], [`GrailError::WrongPassword`], or
    /// [`GrailError::StaleToken`] carrying the current token so the caller can
    /// resynchronize.
    pub fn try_update<F>(
        &self,
        address: &str,
        password: &str,
        token: &Token,
        mutate: F,
    ) -> Result<AccountView, GrailError>
    where
        F: FnOnce(&mut GrailAccount),
    {
        let address = Address::new(address);
        let updated = self.store.find_and_modify(
            &address,
            |current| current.password.verify(password) && current.token == *token,
            |account| {
                mutate(account);
                account.token = self.tokens.next_token();
                account.update_count = account.update_count.saturating_add(1);
                account.modified_at = Utc::now();
            },
        )?;
        if let Some(account) = updated {
            log::debug!(
                "accepted write #{} for {}",
                account.update_count,
                account.address
            );
            return Ok(account.view());
        }

        let Some(current) = self.store.find(&address)? else {
            log::debug!("rejected write for unknown address {address}");
            return Err(GrailError::NotFound { address });
        };
        if !current.password.verify(password) {
            log::warn!("rejected write for {address}: wrong password");
            return Err(GrailError::WrongPassword { address });
        }
        log::debug!(
            "rejected write for {address}: token {token} is stale, current {}",
            current.token
        );
        Err(GrailError::StaleToken {
            address,
            current: current.token,
            specified: token.clone(),
        })
    }

    /// Validate and apply a typed patch under the guarded update.
    ///
    /// # Errors
    ///
    /// Validation failures are reported before the store is touched; see
    /// [`GrailEngine::try_update`] for the rest.
    pub fn apply_patch(
        &self,
        address: &str,
        password: &str,
        token: &Token,
        patch: GrailPatch,
    ) -> Result<AccountView, GrailError> {
        patch.validate()?;
        if let GrailPatch::Item { mode, path, .. } = &patch {
            if !self.catalog(*mode).is_slot(path) {
                return Err(GrailError::Validation { field: "path" });
            }
        }
        self.try_update(address, password, token, |account| patch.apply(account))
    }

    /// Edit one item slot.
    ///
    /// # Errors
    ///
    /// See [`GrailEngine::apply_patch`].
    pub fn update_item(
        &self,
        address: &str,
        password: &str,
        token: &Token,
        mode: GrailMode,
        path: ItemPath,
        record: ItemRecord,
    ) -> Result<AccountView, GrailError> {
        self.apply_patch(address, password, token, GrailPatch::Item { mode, path, record })
    }

    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] for unknown addresses.
    pub fn validate_password(&self, address: &str, password: &str) -> Result<bool, GrailError> {
        let account = self.find(&Address::new(address))?;
        Ok(!password.is_empty() && account.password.verify(password))
    }

    /// Per-category statistics of one account's checklist.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] for unknown addresses.
    pub fn stats(&self, address: &str, mode: GrailMode) -> Result<GrailStats, GrailError> {
        let account = self.find(&Address::new(address))?;
        Ok(stats::reduce(
            self.catalog(mode),
            account.trees.get(mode),
            self.scores(mode),
        ))
    }

    /// One account's checklist for `mode` in its full nested form: every
    /// catalog slot is present, untouched slots as empty records.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] for unknown addresses.
    pub fn checklist(
        &self,
        address: &str,
        mode: GrailMode,
    ) -> Result<serde_json::Value, GrailError> {
        let account = self.find(&Address::new(address))?;
        let catalog = self.catalog(mode);
        Ok(account
            .trees
            .get(mode)
            .map_or_else(|| catalog.template_value(), |tree| tree.to_nested(catalog)))
    }

    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] for unknown addresses.
    pub fn progress(
        &self,
        address: &str,
        mode: GrailMode,
    ) -> Result<Vec<CategoryProgress>, GrailError> {
        let account = self.find(&Address::new(address))?;
        Ok(stats::progress(self.catalog(mode), account.trees.get(mode)))
    }

    fn roster(&self, leader: &Address) -> Result<PartyRoster, GrailError> {
        self.store
            .roster_for(leader)?
            .ok_or_else(|| GrailError::NotFound {
                address: leader.clone(),
            })
    }

    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] when `leader` has no party.
    pub fn party_roster(&self, leader: &str) -> Result<PartyRoster, GrailError> {
        self.roster(&Address::new(leader))
    }

    fn member_accounts(
        &self,
        roster: &PartyRoster,
    ) -> Result<Vec<(Address, Option<GrailAccount>)>, GrailError> {
        let mut accounts = Vec::with_capacity(roster.len());
        for member in roster.members() {
            accounts.push((member.clone(), self.store.find(member)?));
        }
        Ok(accounts)
    }

    /// The one party merge. Every party read, stats and totals included, is
    /// derived from the view built here.
    fn merge_party(
        &self,
        leader: Address,
        accounts: &[(Address, Option<GrailAccount>)],
    ) -> PartyView {
        let mut aggregator = PartyAggregator::new(leader, self.config.note_delimiter.clone());
        for (member, account) in accounts {
            match account {
                Some(account) => aggregator.add(account),
                None => log::warn!("party member {member} has no grail, skipping"),
            }
        }
        let mut view = aggregator.finish();
        for mode in GrailMode::ALL {
            view.reduce_stats(mode, self.catalog(mode), self.scores(mode));
        }
        view
    }

    /// Read-only union of every member's checklists, with statistics of the
    /// merged checklist for every mode. Members whose account has disappeared
    /// contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] when `leader` has no party.
    pub fn party_view(&self, leader: &str) -> Result<PartyView, GrailError> {
        let leader = Address::new(leader);
        let roster = self.roster(&leader)?;
        let accounts = self.member_accounts(&roster)?;
        Ok(self.merge_party(leader, &accounts))
    }

    /// Statistics of the merged party checklist.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] when `leader` has no party.
    pub fn party_stats(&self, leader: &str, mode: GrailMode) -> Result<GrailStats, GrailError> {
        let mut view = self.party_view(leader)?;
        Ok(view
            .stats
            .remove(&mode)
            .unwrap_or_else(|| GrailStats::unfound(self.catalog(mode))))
    }

    /// Rank party members for `mode`. The totals row is the merged party
    /// checklist, read from the same account snapshot as the rows.
    ///
    /// # Errors
    ///
    /// Returns [`GrailError::NotFound`] when `leader` has no party.
    pub fn leaderboard(
        &self,
        leader: &str,
        mode: GrailMode,
        sort: SortKey,
    ) -> Result<Leaderboard, GrailError> {
        let leader = Address::new(leader);
        let roster = self.roster(&leader)?;
        let accounts = self.member_accounts(&roster)?;
        let mut view = self.merge_party(leader, &accounts);
        let party = view
            .stats
            .remove(&mode)
            .unwrap_or_else(|| GrailStats::unfound(self.catalog(mode)));
        let members = accounts.iter().map(|(member, account)| {
            let stats = account
                .as_ref()
                .and_then(|account| account.trees.get(mode))
                .map(|tree| stats::reduce(self.catalog(mode), Some(tree), self.scores(mode)));
            (member.to_string(), stats)
        });
        Ok(Leaderboard::build(self.catalog(mode), members, &party, sort))
    }

    /// # Errors
    ///
    /// Returns [`GrailError::Unknown`] if the store cannot be listed.
    pub fn site_statistics(&self, now: DateTime<Utc>) -> Result<SiteStatistics, GrailError> {
        let accounts = self.store.all()?;
        Ok(SiteStatistics::summarize(
            &accounts,
            now,
            self.config.stats_window(),
        ))
    }

    fn authenticate(&self, address: &Address, password: &str) -> Result<(), GrailError> {
        let account = self.find(address)?;
        if password.is_empty() || !account.password.verify(password) {
            return Err(GrailError::WrongPassword {
                address: address.clone(),
            });
        }
        Ok(())
    }

    /// Start a party led by `leader`.
    ///
    /// # Errors
    ///
    /// [`GrailError::WrongPassword`] for a bad password and
    /// [`GrailError::DuplicateKey`] when the leader already has a party.
    pub fn create_party(&self, leader: &str, password: &str) -> Result<PartyRoster, GrailError> {
        let leader = Address::new(leader);
        self.authenticate(&leader, password)?;
        let roster = PartyRoster::new(leader);
        self.store.insert_roster(roster.clone())?;
        log::info!("created party for {}", roster.leader);
        Ok(roster)
    }

    /// Add an existing account to the leader's party. Adding a present member
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// [`GrailError::NotFound`] when the member account or the party is
    /// missing, and [`GrailError::Validation`] on `members` when the party is
    /// full.
    pub fn add_party_member(
        &self,
        leader: &str,
        password: &str,
        member: &str,
    ) -> Result<PartyRoster, GrailError> {
        let leader = Address::new(leader);
        self.authenticate(&leader, password)?;
        let member = self.find(&Address::new(member))?.address;
        let cap = self.config.max_party_size;
        let mut full = false;
        let edited = self.store.modify_roster(&leader, |roster| {
            if roster.contains(&member) {
                return false;
            }
            if cap.is_some_and(|cap| roster.len() >= cap) {
                full = true;
                return false;
            }
            roster.add_member(member.clone())
        })?;
        if edited.is_none() {
            return Err(GrailError::NotFound { address: leader });
        }
        if full {
            return Err(GrailError::Validation { field: "members" });
        }
        self.roster(&leader)
    }

    /// Remove a member from the leader's party. The leader cannot leave.
    ///
    /// # Errors
    ///
    /// [`GrailError::NotFound`] when the party is missing and
    /// [`GrailError::Validation`] on `members` when removing the leader.
    pub fn remove_party_member(
        &self,
        leader: &str,
        password: &str,
        member: &str,
    ) -> Result<PartyRoster, GrailError> {
        let leader = Address::new(leader);
        let member = Address::new(member);
        self.authenticate(&leader, password)?;
        if member == leader {
            return Err(GrailError::Validation { field: "members" });
        }
        if self
            .store
            .modify_roster(&leader, |roster| roster.remove_member(&member))?
            .is_none()
        {
            return Err(GrailError::NotFound { address: leader });
        }
        self.roster(&leader)
    }
}
