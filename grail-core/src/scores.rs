//! Rarity weights used for the completion score.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::catalog::{GrailMode, ItemPath};

const DEFAULT_SCORES_DATA: &str = include_str!("../assets/data/scores.json");

/// Total score of a fully completed holy grail catalog.
pub const COMPLETION_SCORE_TARGET: u32 = 3000;

/// Parent key of the legacy grouping that lists every facet variant once.
/// Facets under it count double.
pub const LEGACY_COMBINED_GROUP: &str = "all";

/// Static mapping from leaf name to rarity weight, versioned with the catalog.
///
/// Leaves missing from `weights` are facets and fall back to `facet`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreTable {
    #[serde(default)]
    pub version: String,
    pub facet: u32,
    #[serde(default)]
    pub weights: HashMap<String, u32>,
}

impl ScoreTable {
    /// Table that scores every leaf as zero.
    #[must_use]
    pub fn unscored() -> Self {
        Self::default()
    }

    /// Load the bundled holy grail weights.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON cannot be parsed.
    pub fn load_default() -> Result<Self, serde_json::Error> {
        serde_json::from_str(DEFAULT_SCORES_DATA)
    }

    /// Weight of a found leaf at `path`.
    #[must_use]
    pub fn score_for(&self, path: &ItemPath) -> u32 {
        let name = path.name().unwrap_or_default();
        if let Some(weight) = self.weights.get(name) {
            return *weight;
        }
        if path.parent_key() == Some(LEGACY_COMBINED_GROUP) {
            self.facet.saturating_mul(2)
        } else {
            self.facet
        }
    }

    #[must_use]
    pub fn is_facet(&self, path: &ItemPath) -> bool {
        path.name().is_none_or(|name| !self.weights.contains_key(name))
    }
}

/// Shared weights for `mode`. Only the holy grail carries rarity weights.
#[must_use]
pub fn score_table(mode: GrailMode) -> &'static ScoreTable {
    static HOLY: OnceLock<ScoreTable> = OnceLock::new();
    static UNSCORED: OnceLock<ScoreTable> = OnceLock::new();
    match mode {
        GrailMode::Holy => HOLY.get_or_init(|| {
            ScoreTable::load_default().unwrap_or_else(|err| {
                log::error!("bundled score table failed to load: {err}");
                ScoreTable::unscored()
            })
        }),
        GrailMode::Eth | GrailMode::Runeword => UNSCORED.get_or_init(ScoreTable::unscored),
    }
}
