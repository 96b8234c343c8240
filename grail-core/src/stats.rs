//! Per-category statistics derived from one checklist.
//!
//! Statistics are never stored. They are recomputed from a tree and the
//! catalog on every read, walking slots depth-first in declaration order so
//! position `i` of every vector means the same item for every account.
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::catalog::{Catalog, CategoryDef};
use crate::codec;
use crate::scores::ScoreTable;
use crate::tree::PlayerTree;

/// Wire shape of one category, consumed by leaderboards.
///
/// `found_bits.len() == item_scores.len()` == the category's slot count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub missing: usize,
    pub found_bits: String,
    pub item_scores: Vec<u32>,
}

impl CategoryStats {
    /// Statistics of a category where nothing has been found.
    #[must_use]
    pub fn unfound(slots: usize) -> Self {
        Self {
            missing: slots,
            found_bits: "0".repeat(slots),
            item_scores: vec![0; slots],
        }
    }

    fn push(&mut self, found: bool, score: u32) {
        if found {
            self.found_bits.push('1');
            self.item_scores.push(score);
        } else {
            self.missing += 1;
            self.found_bits.push('0');
            self.item_scores.push(0);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.found_bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found_bits.is_empty()
    }

    #[must_use]
    pub fn found(&self) -> usize {
        codec::count_found(&self.found_bits)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.item_scores.iter().sum()
    }
}

/// Statistics for every stat category of a mode, in catalog order, plus the
/// total completion score.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrailStats {
    pub categories: Vec<(String, CategoryStats)>,
    pub item_score: u32,
}

impl GrailStats {
    /// Statistics of a member with no saved tree.
    #[must_use]
    pub fn unfound(catalog: &Catalog) -> Self {
        let categories = catalog
            .categories()
            .iter()
            .map(|def| {
                let slots = catalog.slots_under(&def.path).len();
                (def.key.clone(), CategoryStats::unfound(slots))
            })
            .collect();
        Self {
            categories,
            item_score: 0,
        }
    }

    #[must_use]
    pub fn category(&self, key: &str) -> Option<&CategoryStats> {
        self.categories
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, stats)| stats)
    }

    #[must_use]
    pub fn total_missing(&self) -> usize {
        self.categories.iter().map(|(_, stats)| stats.missing).sum()
    }
}

impl Serialize for GrailStats {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.categories.len() + 1))?;
        for (key, stats) in &self.categories {
            map.serialize_entry(key, stats)?;
        }
        map.serialize_entry("itemScore", &self.item_score)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for GrailStats {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let mut stats = Self::default();
        for (key, value) in map {
            if key == "itemScore" {
                stats.item_score = serde_json::from_value(value).map_err(D::Error::custom)?;
            } else {
                let category = serde_json::from_value(value).map_err(D::Error::custom)?;
                stats.categories.push((key, category));
            }
        }
        Ok(stats)
    }
}

/// Found/perfect counts of one category, for progress tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub key: String,
    pub total: usize,
    pub found: usize,
    pub perfects: usize,
}

/// Reduce one category of `tree`.
#[must_use]
pub fn reduce_category(
    catalog: &Catalog,
    def: &CategoryDef,
    tree: &PlayerTree,
    scores: &ScoreTable,
) -> CategoryStats {
    let mut stats = CategoryStats::default();
    for slot in catalog.slots_under(&def.path) {
        let found = tree.record(&slot).is_some_and(|record| record.was_found);
        stats.push(found, scores.score_for(&slot));
    }
    stats
}

/// Reduce a member's tree into per-category statistics.
///
/// An absent tree is expected for members who never saved; it reduces to
/// all-unfound statistics of canonical length instead of failing.
#[must_use]
pub fn reduce(catalog: &Catalog, tree: Option<&PlayerTree>, scores: &ScoreTable) -> GrailStats {
    let Some(tree) = tree else {
        log::debug!("no saved {} tree, reducing to unfound", catalog.mode());
        return GrailStats::unfound(catalog);
    };
    let categories: Vec<(String, CategoryStats)> = catalog
        .categories()
        .iter()
        .map(|def| (def.key.clone(), reduce_category(catalog, def, tree, scores)))
        .collect();
    let item_score = categories.iter().map(|(_, stats)| stats.score()).sum();
    GrailStats {
        categories,
        item_score,
    }
}

/// Found and perfect counts per stat category.
#[must_use]
pub fn progress(catalog: &Catalog, tree: Option<&PlayerTree>) -> Vec<CategoryProgress> {
    catalog
        .categories()
        .iter()
        .map(|def| {
            let slots = catalog.slots_under(&def.path);
            let (found, perfects) = tree.map_or((0, 0), |tree| {
                slots.iter().fold((0, 0), |(found, perfects), slot| {
                    let record = tree.record(slot);
                    (
                        found + usize::from(record.is_some_and(|r| r.was_found)),
                        perfects + usize::from(record.is_some_and(|r| r.is_perfect)),
                    )
                })
            });
            CategoryProgress {
                key: def.key.clone(),
                total: slots.len(),
                found,
                perfects,
            }
        })
        .collect()
}
