//! Static checklist catalogs.
//!
//! A catalog is the fixed taxonomy of one checklist mode. It is decoded once
//! from its JSON asset into an explicit [`CatalogNode`] tree; from then on the
//! declaration order of the asset is the canonical order of every bit vector
//! and score vector derived from it.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::hash::Hasher;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::recognize::{self, NodeKind};
use crate::scores::{self, ScoreTable};

const HOLY_CATALOG_DATA: &str = include_str!("../assets/data/holy.json");
const ETH_CATALOG_DATA: &str = include_str!("../assets/data/eth.json");
const RUNEWORD_CATALOG_DATA: &str = include_str!("../assets/data/runeword.json");

/// Checklist modes an account tracks independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrailMode {
    /// Uniques, sets and runes
    Holy,
    /// Ethereal uniques
    Eth,
    /// Runewords
    Runeword,
}

impl GrailMode {
    pub const ALL: [Self; 3] = [Self::Holy, Self::Eth, Self::Runeword];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Holy => "holy",
            Self::Eth => "eth",
            Self::Runeword => "runeword",
        }
    }
}

impl fmt::Display for GrailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrailMode {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "holy" | "grail" => Ok(Self::Holy),
            "eth" | "ethereal" => Ok(Self::Eth),
            "runeword" | "runewords" => Ok(Self::Runeword),
            other => Err(CatalogError::UnknownMode(other.to_string())),
        }
    }
}

/// Names leading from the catalog root to a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemPath(SmallVec<[String; 6]>);

impl ItemPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a `/`-separated path such as `runes/Ber`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split('/').map(str::trim).filter(|s| !s.is_empty()))
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Leaf name, the last segment.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Key of the immediate parent grouping.
    #[must_use]
    pub fn parent_key(&self) -> Option<&str> {
        let len = self.0.len();
        if len < 2 {
            return None;
        }
        self.0.get(len - 2).map(String::as_str)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &[String]) -> bool {
        self.0.starts_with(prefix)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Errors raised while decoding a catalog asset.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog json invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog node at `{path}` is not an object")]
    InvalidNode { path: String },
    #[error("stat category `{key}` points at `{path}`, which is not a catalog category")]
    UnknownCategoryPath { key: String, path: String },
    #[error("unknown grail mode `{0}`")]
    UnknownMode(String),
    #[error("catalog asset declares mode {found}, expected {expected}")]
    ModeMismatch { expected: GrailMode, found: GrailMode },
}

/// One node of the catalog taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogNode {
    /// Ordered named children; order drives bit-vector positions.
    Category(Vec<(String, CatalogNode)>),
    ItemSlot,
}

impl CatalogNode {
    fn from_value(value: &Value, path: &mut Vec<String>) -> Result<Self, CatalogError> {
        if !value.is_object() {
            return Err(CatalogError::InvalidNode {
                path: path.join("/"),
            });
        }
        match recognize::classify(value) {
            NodeKind::Item => Ok(Self::ItemSlot),
            NodeKind::Category => {
                let mut children = Vec::new();
                for (name, child) in recognize::children(value) {
                    path.push(name.to_string());
                    children.push((name.to_string(), Self::from_value(child, path)?));
                    path.pop();
                }
                Ok(Self::Category(children))
            }
        }
    }

    #[must_use]
    pub const fn is_slot(&self) -> bool {
        matches!(self, Self::ItemSlot)
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Category(children) => children
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, node)| node),
            Self::ItemSlot => None,
        }
    }

    /// Number of item slots at or below this node.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        match self {
            Self::ItemSlot => 1,
            Self::Category(children) => children.iter().map(|(_, node)| node.slot_count()).sum(),
        }
    }

    fn collect_slots(&self, prefix: &mut Vec<String>, out: &mut Vec<ItemPath>) {
        match self {
            Self::ItemSlot => out.push(ItemPath::new(prefix.iter().cloned())),
            Self::Category(children) => {
                for (name, node) in children {
                    prefix.push(name.clone());
                    node.collect_slots(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    fn to_template_value(&self) -> Value {
        match self {
            Self::ItemSlot => Value::Object(Map::new()),
            Self::Category(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_template_value()))
                    .collect(),
            ),
        }
    }
}

/// A named stat category: a key such as `uniqueArmor` and the catalog
/// subtree it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDef {
    pub key: String,
    pub path: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogAsset {
    mode: GrailMode,
    version: String,
    #[serde(default)]
    categories: Map<String, Value>,
    tree: Value,
}

/// Decoded catalog for one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    mode: GrailMode,
    version: String,
    categories: Vec<CategoryDef>,
    root: CatalogNode,
}

impl Catalog {
    /// Decode a catalog asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a node is not an object, or
    /// a stat category does not point at a category of the tree.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let asset: CatalogAsset = serde_json::from_str(json)?;
        let root = CatalogNode::from_value(&asset.tree, &mut Vec::new())?;
        let mut categories = Vec::with_capacity(asset.categories.len());
        for (key, path) in asset.categories {
            let path: Vec<String> = serde_json::from_value(path)?;
            let catalog_path = path.join("/");
            match node_at(&root, &path) {
                Some(CatalogNode::Category(_)) => categories.push(CategoryDef { key, path }),
                _ => {
                    return Err(CatalogError::UnknownCategoryPath {
                        key,
                        path: catalog_path,
                    });
                }
            }
        }
        Ok(Self {
            mode: asset.mode,
            version: asset.version,
            categories,
            root,
        })
    }

    /// Catalog with no slots, used when an asset cannot be decoded.
    #[must_use]
    pub fn empty(mode: GrailMode) -> Self {
        Self {
            mode,
            version: String::new(),
            categories: Vec::new(),
            root: CatalogNode::Category(Vec::new()),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> GrailMode {
        self.mode
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn root(&self) -> &CatalogNode {
        &self.root
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryDef] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, key: &str) -> Option<&CategoryDef> {
        self.categories.iter().find(|def| def.key == key)
    }

    #[must_use]
    pub fn node(&self, path: &[String]) -> Option<&CatalogNode> {
        node_at(&self.root, path)
    }

    #[must_use]
    pub fn is_slot(&self, path: &ItemPath) -> bool {
        self.node(path.segments()).is_some_and(CatalogNode::is_slot)
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.root.slot_count()
    }

    /// Every slot path in canonical (depth-first, declaration) order.
    #[must_use]
    pub fn slots(&self) -> Vec<ItemPath> {
        self.slots_under(&[])
    }

    /// Slot paths below `prefix` in canonical order; empty if `prefix` is not
    /// part of the catalog.
    #[must_use]
    pub fn slots_under(&self, prefix: &[String]) -> Vec<ItemPath> {
        let mut out = Vec::new();
        if let Some(node) = self.node(prefix) {
            node.collect_slots(&mut prefix.to_vec(), &mut out);
        }
        out
    }

    /// Nested JSON shape of the catalog with an empty record at every slot.
    #[must_use]
    pub fn template_value(&self) -> Value {
        self.root.to_template_value()
    }

    /// Stable hash of the canonical slot order. Two catalogs with the same
    /// fingerprint produce position-compatible vectors.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for slot in self.slots() {
            hasher.write(slot.to_string().as_bytes());
            hasher.write_u8(0);
        }
        hasher.finish()
    }
}

fn node_at<'a>(root: &'a CatalogNode, path: &[String]) -> Option<&'a CatalogNode> {
    path.iter()
        .try_fold(root, |node, segment| node.child(segment))
}

/// Trait for abstracting catalog loading. Platform-specific front ends can
/// serve catalogs from elsewhere; [`StaticCatalogs`] uses the bundled assets.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the catalog for `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or decoded.
    fn load_catalog(&self, mode: GrailMode) -> Result<Catalog, Self::Error>;

    /// Score table paired with the catalog for `mode`. Weights are keyed by
    /// slot name, so a loader serving its own catalogs should serve matching
    /// weights; the default is the bundled table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded.
    fn load_scores(&self, mode: GrailMode) -> Result<ScoreTable, Self::Error> {
        Ok(scores::score_table(mode).clone())
    }
}

/// Catalogs compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogs;

impl StaticCatalogs {
    const fn asset(mode: GrailMode) -> &'static str {
        match mode {
            GrailMode::Holy => HOLY_CATALOG_DATA,
            GrailMode::Eth => ETH_CATALOG_DATA,
            GrailMode::Runeword => RUNEWORD_CATALOG_DATA,
        }
    }
}

impl CatalogLoader for StaticCatalogs {
    type Error = CatalogError;

    fn load_catalog(&self, mode: GrailMode) -> Result<Catalog, Self::Error> {
        let catalog = Catalog::from_json(Self::asset(mode))?;
        if catalog.mode != mode {
            return Err(CatalogError::ModeMismatch {
                expected: mode,
                found: catalog.mode,
            });
        }
        Ok(catalog)
    }
}

/// Shared bundled catalog for `mode`, decoded on first use.
#[must_use]
pub fn catalog(mode: GrailMode) -> &'static Catalog {
    static HOLY: OnceLock<Catalog> = OnceLock::new();
    static ETH: OnceLock<Catalog> = OnceLock::new();
    static RUNEWORD: OnceLock<Catalog> = OnceLock::new();
    let cell = match mode {
        GrailMode::Holy => &HOLY,
        GrailMode::Eth => &ETH,
        GrailMode::Runeword => &RUNEWORD,
    };
    cell.get_or_init(|| {
        StaticCatalogs.load_catalog(mode).unwrap_or_else(|err| {
            log::error!("bundled {mode} catalog failed to load: {err}");
            Catalog::empty(mode)
        })
    })
}
