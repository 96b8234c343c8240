//! Structural classification of nested checklist JSON.
//!
//! Stored checklists and catalog assets share one nested shape: objects all
//! the way down, where the leaves are item records. A leaf is recognized by
//! its attributes rather than by any tag:
//!
//! * an object with no attributes is an untouched item slot, and
//! * an object carrying at least one [`ITEM_RECORD_FIELDS`] attribute is an item.
//!
//! Every other object is a category. The empty-object rule means a category
//! with zero children cannot exist; catalogs must never declare one, since the
//! bit-vector length of every account depends on this rule.
use serde_json::{Map, Value};

/// Attribute names that mark an object as an item record.
pub const ITEM_RECORD_FIELDS: [&str; 3] = ["wasFound", "note", "isPerfect"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Item,
    Category,
}

/// Classify one node of a nested checklist.
///
/// Non-object values (nulls, scalars, arrays) are neither items nor
/// containers of items; they classify as [`NodeKind::Category`] and
/// [`children`] yields nothing for them.
#[must_use]
pub fn classify(node: &Value) -> NodeKind {
    match node {
        Value::Object(map) if is_item_map(map) => NodeKind::Item,
        _ => NodeKind::Category,
    }
}

#[must_use]
pub fn is_item(node: &Value) -> bool {
    classify(node) == NodeKind::Item
}

fn is_item_map(map: &Map<String, Value>) -> bool {
    map.is_empty() || ITEM_RECORD_FIELDS.iter().any(|field| map.contains_key(*field))
}

/// Named children of a category node, in document order.
pub fn children(node: &Value) -> impl Iterator<Item = (&str, &Value)> {
    node.as_object()
        .into_iter()
        .flat_map(|map| map.iter().map(|(key, value)| (key.as_str(), value)))
}

/// Depth-first visit of every item leaf below `node`, in document order.
///
/// The callback receives the names leading to the leaf (including the leaf's
/// own name) and the leaf value.
pub fn visit_items<'a, F>(node: &'a Value, f: &mut F)
where
    F: FnMut(&[&'a str], &'a Value),
{
    let mut path = Vec::new();
    visit_inner(node, &mut path, f);
}

fn visit_inner<'a, F>(node: &'a Value, path: &mut Vec<&'a str>, f: &mut F)
where
    F: FnMut(&[&'a str], &'a Value),
{
    for (name, child) in children(node) {
        path.push(name);
        match classify(child) {
            NodeKind::Item => f(path.as_slice(), child),
            NodeKind::Category => visit_inner(child, path, f),
        }
        path.pop();
    }
}
