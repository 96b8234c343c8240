//! Party leaderboard built from per-member statistics.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::catalog::Catalog;
use crate::stats::GrailStats;

/// Column a leaderboard is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Total missing items, fewest first
    #[default]
    Total,
    /// Missing items of one stat category, fewest first
    Category(String),
    /// Completion score, highest first
    ItemScore,
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "total" => Self::Total,
            "itemScore" | "score" => Self::ItemScore,
            other => Self::Category(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub name: String,
    /// Missing count per stat category, in catalog order.
    pub missing: Vec<(String, usize)>,
    pub total: usize,
    pub item_score: u32,
}

impl LeaderboardRow {
    fn from_stats(name: String, stats: &GrailStats) -> Self {
        let missing: Vec<(String, usize)> = stats
            .categories
            .iter()
            .map(|(key, category)| (key.clone(), category.missing))
            .collect();
        Self {
            name,
            total: missing.iter().map(|(_, count)| count).sum(),
            missing,
            item_score: stats.item_score,
        }
    }

    #[must_use]
    pub fn missing_in(&self, key: &str) -> Option<usize> {
        self.missing
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, count)| *count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub rows: Vec<LeaderboardRow>,
    pub totals: LeaderboardRow,
    pub sorted_by: SortKey,
    /// Hex fingerprint of the catalog's slot order. Vectors from boards with
    /// different layouts are not position-compatible.
    pub layout: String,
}

impl Leaderboard {
    /// Build from member statistics. Members with `None` never saved and
    /// count as missing everything.
    ///
    /// `party` is the reduction of the merged party checklist and becomes the
    /// totals row.
    pub fn build<I>(catalog: &Catalog, members: I, party: &GrailStats, sort: SortKey) -> Self
    where
        I: IntoIterator<Item = (String, Option<GrailStats>)>,
    {
        let baseline = GrailStats::unfound(catalog);
        let rows = members
            .into_iter()
            .map(|(name, stats)| {
                LeaderboardRow::from_stats(name, stats.as_ref().unwrap_or(&baseline))
            })
            .collect();
        let mut board = Self {
            rows,
            totals: LeaderboardRow::from_stats("Totals".to_string(), party),
            sorted_by: SortKey::Total,
            layout: format!("{:016x}", catalog.fingerprint()),
        };
        board.sort(sort);
        board
    }

    /// Stable sort; ties keep roster order.
    pub fn sort(&mut self, key: SortKey) {
        self.rows.sort_by(|a, b| compare(a, b, &key));
        self.sorted_by = key;
    }
}

fn compare(a: &LeaderboardRow, b: &LeaderboardRow, key: &SortKey) -> Ordering {
    match key {
        SortKey::Total => a.total.cmp(&b.total),
        SortKey::ItemScore => b.item_score.cmp(&a.item_score),
        SortKey::Category(category) => a.missing_in(category).cmp(&b.missing_in(category)),
    }
}
