//! pdk-schemas
//!
//! Wire contract between exchange adapters and the normalization layer.
//! Records stay in venue-native field names; nothing here interprets them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One venue-native JSON object (account summary, position, order, fill).
pub type RawRecord = Map<String, Value>;

/// Everything an adapter could fetch for one (sub-)account.
///
/// Adapters fill a sub-field they could not fetch with an empty map / list
/// instead of omitting it, so every record has the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAccountRecord {
    #[serde(default)]
    pub summary: RawRecord,
    #[serde(default)]
    pub positions: Vec<RawRecord>,
    #[serde(default)]
    pub open_orders: Vec<RawRecord>,
    #[serde(default)]
    pub fills: Vec<RawRecord>,
}

impl RawAccountRecord {
    /// A record for an account the adapter could not reach at all.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn has_summary(&self) -> bool {
        !self.summary.is_empty()
    }
}

/// Convert a JSON value into a [`RawRecord`], keeping only objects.
pub fn as_record(v: Value) -> Option<RawRecord> {
    match v {
        Value::Object(m) => Some(m),
        _ => None,
    }
}

/// Convert a JSON array into records, silently skipping non-object entries.
pub fn as_records(v: Value) -> Vec<RawRecord> {
    match v {
        Value::Array(items) => items.into_iter().filter_map(as_record).collect(),
        _ => Vec::new(),
    }
}
