//! One player's checklist for one mode.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::catalog::{Catalog, ItemPath};
use crate::recognize::{self, NodeKind};
use crate::record::ItemRecord;

/// Item records keyed by catalog path.
///
/// Only touched records are held; any path without an entry reads as a fresh
/// [`ItemRecord::default`]. The serialized form is the nested object shape
/// clients exchange, and decoding it runs the structural item recognizer, so
/// records stored by older catalog versions survive untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerTree {
    records: BTreeMap<ItemPath, ItemRecord>,
}

impl PlayerTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a nested checklist. Leaves that fail to decode are treated as
    /// untouched rather than rejecting the whole tree.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut records = BTreeMap::new();
        recognize::visit_items(value, &mut |path, leaf| {
            let record = match ItemRecord::deserialize(leaf) {
                Ok(record) => record,
                Err(err) => {
                    log::warn!("ignoring malformed item record at {}: {err}", path.join("/"));
                    return;
                }
            };
            if !record.is_untouched() {
                records.insert(ItemPath::new(path.iter().copied()), record);
            }
        });
        Self { records }
    }

    /// Record at `path`; untouched slots yield a fresh default.
    #[must_use]
    pub fn get(&self, path: &ItemPath) -> ItemRecord {
        self.records.get(path).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn record(&self, path: &ItemPath) -> Option<&ItemRecord> {
        self.records.get(path)
    }

    pub fn set(&mut self, path: ItemPath, record: ItemRecord) {
        if record.is_untouched() {
            self.records.remove(&path);
        } else {
            self.records.insert(path, record);
        }
    }

    /// Mutable access to the record at `path`, inserting an untouched one.
    pub fn entry(&mut self, path: ItemPath) -> &mut ItemRecord {
        self.records.entry(path).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemPath, &ItemRecord)> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn found_count(&self) -> usize {
        self.records.values().filter(|r| r.was_found).count()
    }

    /// Drop entries that read the same as untouched slots.
    pub fn compact(&mut self) {
        self.records.retain(|_, record| !record.is_untouched());
    }

    /// Nested form holding only touched records.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = Value::Object(Map::new());
        for (path, record) in &self.records {
            insert_nested(&mut root, path, record);
        }
        root
    }

    /// Full catalog shape with every slot populated, followed by any records
    /// at paths the catalog does not know.
    #[must_use]
    pub fn to_nested(&self, catalog: &Catalog) -> Value {
        let mut root = catalog.template_value();
        for slot in catalog.slots() {
            insert_nested(&mut root, &slot, &self.get(&slot));
        }
        for (path, record) in &self.records {
            if !catalog.is_slot(path) {
                insert_nested(&mut root, path, record);
            }
        }
        root
    }
}

fn insert_nested(root: &mut Value, path: &ItemPath, record: &ItemRecord) {
    let Some((leaf, parents)) = path.segments().split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        let Value::Object(map) = node else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if recognize::classify(node) == NodeKind::Item && !node.as_object().is_some_and(Map::is_empty) {
            log::warn!("record at {path} is shadowed by an item at {segment}");
            return;
        }
    }
    if let Value::Object(map) = node {
        let value = serde_json::to_value(record).unwrap_or_else(|_| Value::Object(Map::new()));
        map.insert(leaf.clone(), value);
    }
}

impl Serialize for PlayerTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlayerTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl FromIterator<(ItemPath, ItemRecord)> for PlayerTree {
    fn from_iter<T: IntoIterator<Item = (ItemPath, ItemRecord)>>(iter: T) -> Self {
        let mut tree = Self::new();
        for (path, record) in iter {
            tree.set(path, record);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tiny_catalog() -> Catalog {
        Catalog::from_json(
            r#"{"mode":"holy","version":"t","categories":{"runes":["runes"]},
                "tree":{"runes":{"El":{},"Eld":{},"Tir":{}}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn decodes_only_touched_records() {
        let tree = PlayerTree::from_value(&json!({
            "runes": {
                "El": {},
                "Eld": {"wasFound": true, "note": "cows"},
                "Tir": {"wasFound": false, "isPerfect": false, "note": ""}
            }
        }));
        assert_eq!(tree.len(), 1);
        let eld = tree.get(&ItemPath::parse("runes/Eld"));
        assert!(eld.was_found);
        assert_eq!(eld.note, "cows");
        assert!(tree.get(&ItemPath::parse("runes/El")).is_untouched());
    }

    #[test]
    fn untouched_reads_are_fresh_values() {
        let mut tree = PlayerTree::new();
        let mut read = tree.get(&ItemPath::parse("runes/El"));
        read.was_found = true;
        assert!(tree.get(&ItemPath::parse("runes/El")).is_untouched());
        tree.set(ItemPath::parse("runes/El"), read);
        assert_eq!(tree.found_count(), 1);
        tree.set(ItemPath::parse("runes/El"), ItemRecord::default());
        assert!(tree.is_empty());
    }

    #[test]
    fn nested_form_roundtrips_through_serde() {
        let tree: PlayerTree = [
            (ItemPath::parse("runes/Tir"), ItemRecord::found()),
            (
                ItemPath::parse("sets/Angelic Raiment/Angelic Wings"),
                ItemRecord::default().with_note("want"),
            ),
        ]
        .into_iter()
        .collect();
        let encoded = serde_json::to_string(&tree).unwrap();
        let decoded: PlayerTree = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn to_nested_fills_catalog_shape_and_keeps_unknown_paths() {
        let catalog = tiny_catalog();
        let tree: PlayerTree = [
            (ItemPath::parse("runes/Eld"), ItemRecord::found()),
            (ItemPath::parse("runes/Zod"), ItemRecord::found()),
        ]
        .into_iter()
        .collect();
        let nested = tree.to_nested(&catalog);
        let runes = nested["runes"].as_object().unwrap();
        let keys: Vec<&str> = runes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["El", "Eld", "Tir", "Zod"]);
        assert_eq!(runes["El"]["wasFound"], json!(false));
        assert_eq!(runes["Eld"]["wasFound"], json!(true));
    }
}
