//! Per-item checklist records.
use serde::{Deserialize, Serialize};

/// Separator placed between member notes when records are merged.
pub const NOTE_DELIMITER: &str = " --- ";

/// State of one item slot. The default value is the untouched slot.
///
/// `is_perfect` does not imply `was_found`; callers keep them consistent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub was_found: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_perfect: bool,
    #[serde(default, deserialize_with = "lenient_note")]
    pub note: String,
}

impl ItemRecord {
    #[must_use]
    pub fn found() -> Self {
        Self {
            was_found: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    #[must_use]
    pub fn is_untouched(&self) -> bool {
        *self == Self::default()
    }

    /// Fold another member's record into this one.
    ///
    /// Found and perfect flags are OR-ed; non-empty notes are appended in call
    /// order, separated by `delimiter`.
    pub fn absorb(&mut self, other: &Self, delimiter: &str) {
        self.was_found |= other.was_found;
        self.is_perfect |= other.is_perfect;
        if other.note.is_empty() {
            return;
        }
        if !self.note.is_empty() {
            self.note.push_str(delimiter);
        }
        self.note.push_str(&other.note);
    }
}

// Older clients stored found flags as 0/1 and occasionally null.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(flag) => flag,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

fn lenient_note<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(note) => note,
        _ => String::new(),
    })
}
