//! Party aggregation: N-way union of member checklists.
//!
//! The merge is a monotonic union keyed by item path. Found and perfect flags
//! are OR-ed, notes are concatenated in roster order, and paths present in
//! any member survive in the result. Nothing a member has can be removed by
//! another member, and a member without a saved tree contributes nothing.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::account::{GrailAccount, GrailTrees};
use crate::address::Address;
use crate::catalog::{Catalog, GrailMode};
use crate::record::NOTE_DELIMITER;
use crate::scores::ScoreTable;
use crate::stats::{self, GrailStats};
use crate::tree::PlayerTree;

/// Fold one member's records into the accumulator.
pub fn merge_into(party: &mut PlayerTree, member: &PlayerTree, delimiter: &str) {
    for (path, record) in member.iter() {
        party.entry(path.clone()).absorb(record, delimiter);
    }
}

/// Union of every saved member tree, in iteration order. An empty roster
/// yields an empty tree, which reads as the catalog template.
#[must_use]
pub fn aggregate<'a, I>(members: I) -> PlayerTree
where
    I: IntoIterator<Item = Option<&'a PlayerTree>>,
{
    aggregate_with(members, NOTE_DELIMITER)
}

#[must_use]
pub fn aggregate_with<'a, I>(members: I, delimiter: &str) -> PlayerTree
where
    I: IntoIterator<Item = Option<&'a PlayerTree>>,
{
    let mut party = PlayerTree::new();
    for member in members.into_iter().flatten() {
        merge_into(&mut party, member, delimiter);
    }
    party.compact();
    party
}

/// Read-only aggregate of a party, computed on demand.
///
/// `stats` holds statistics reduced from the merged `trees`, one entry per
/// mode that has been reduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyView {
    pub leader: Address,
    pub members: Vec<Address>,
    pub version: Option<String>,
    #[serde(flatten)]
    pub trees: GrailTrees,
    pub update_count: u64,
    pub read_only: bool,
    pub has_party: bool,
    #[serde(default)]
    pub stats: BTreeMap<GrailMode, GrailStats>,
}

impl PartyView {
    /// Reduce the merged tree of `mode` and keep the result in the view.
    pub fn reduce_stats(&mut self, mode: GrailMode, catalog: &Catalog, scores: &ScoreTable) {
        let reduced = stats::reduce(catalog, self.trees.get(mode), scores);
        self.stats.insert(mode, reduced);
    }

    #[must_use]
    pub fn stats_for(&self, mode: GrailMode) -> Option<&GrailStats> {
        self.stats.get(&mode)
    }
}

/// Accumulates member accounts into a [`PartyView`].
#[derive(Debug, Clone)]
pub struct PartyAggregator {
    leader: Address,
    delimiter: String,
    members: Vec<Address>,
    trees: GrailTrees,
    update_count: u64,
    version: Option<String>,
}

impl PartyAggregator {
    #[must_use]
    pub fn new(leader: Address, delimiter: impl Into<String>) -> Self {
        Self {
            leader,
            delimiter: delimiter.into(),
            members: Vec::new(),
            trees: GrailTrees::default(),
            update_count: 0,
            version: None,
        }
    }

    /// Fold one member. Members are folded in roster order so merged notes
    /// keep that order.
    pub fn add(&mut self, account: &GrailAccount) {
        self.members.push(account.address.clone());
        self.update_count = self.update_count.saturating_add(account.update_count);
        if account.address == self.leader || self.version.is_none() {
            self.version.clone_from(&account.version);
        }
        for mode in GrailMode::ALL {
            let Some(tree) = account.trees.get(mode) else {
                continue;
            };
            let party = self.trees.get_or_create(mode);
            merge_into(party, tree, &self.delimiter);
        }
    }

    #[must_use]
    pub fn finish(mut self) -> PartyView {
        for mode in GrailMode::ALL {
            let party = self.trees.get_or_create(mode);
            party.compact();
        }
        PartyView {
            leader: self.leader,
            members: self.members,
            version: self.version,
            trees: self.trees,
            update_count: self.update_count,
            read_only: true,
            has_party: true,
            stats: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemPath;
    use crate::record::ItemRecord;
    use crate::store::fixtures::account;

    fn tree(entries: &[(&str, ItemRecord)]) -> PlayerTree {
        entries
            .iter()
            .map(|(path, record)| (ItemPath::parse(path), record.clone()))
            .collect()
    }

    #[test]
    fn notes_concatenate_in_member_order() {
        let a = tree(&[("runes/Ber", ItemRecord::found().with_note("Found by Bob"))]);
        let b = tree(&[(
            "runes/Ber",
            ItemRecord::found().with_note("Also found by Alice"),
        )]);
        let party = aggregate([Some(&a), Some(&b)]);
        let ber = party.get(&ItemPath::parse("runes/Ber"));
        assert!(ber.was_found);
        assert_eq!(ber.note, "Found by Bob --- Also found by Alice");
    }

    #[test]
    fn keys_missing_from_a_member_are_kept() {
        let a = tree(&[("runes/Ber", ItemRecord::found())]);
        let b = tree(&[("runes/Jah", ItemRecord::found())]);
        let party = aggregate([Some(&a), Some(&b)]);
        assert_eq!(party.found_count(), 2);
    }

    #[test]
    fn absent_members_change_nothing() {
        let a = tree(&[("runes/Ber", ItemRecord::found().with_note("x"))]);
        assert_eq!(aggregate([Some(&a), None]), aggregate([Some(&a)]));
        assert!(aggregate(std::iter::empty()).is_empty());
    }

    #[test]
    fn perfect_flags_or_together() {
        let a = tree(&[(
            "runes/Ber",
            ItemRecord {
                was_found: false,
                is_perfect: true,
                note: String::new(),
            },
        )]);
        let b = tree(&[("runes/Ber", ItemRecord::found())]);
        let ber = aggregate([Some(&a), Some(&b)]).get(&ItemPath::parse("runes/Ber"));
        assert!(ber.was_found && ber.is_perfect);
    }

    #[test]
    fn view_stats_come_from_the_merged_tree() {
        let catalog = Catalog::from_json(
            r#"{"mode":"holy","version":"t",
                "categories":{"runes":["runes"]},
                "tree":{"runes":{"El":{},"Eld":{},"Tir":{}}}}"#,
        )
        .unwrap();
        let mut bob = account("bob");
        bob.trees.holy = Some(tree(&[("runes/El", ItemRecord::found())]));
        let mut amy = account("amy");
        amy.trees.holy = Some(tree(&[("runes/Tir", ItemRecord::found())]));

        let mut aggregator = PartyAggregator::new(bob.address.clone(), NOTE_DELIMITER);
        aggregator.add(&bob);
        aggregator.add(&amy);
        let mut view = aggregator.finish();
        assert!(view.stats_for(GrailMode::Holy).is_none());
        view.reduce_stats(GrailMode::Holy, &catalog, &ScoreTable::unscored());

        let runes = view.stats_for(GrailMode::Holy).unwrap().category("runes").unwrap();
        assert_eq!(runes.found_bits, "101");
        assert_eq!(runes.missing, 1);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["stats"]["holy"]["runes"]["foundBits"], "101");
    }
}
