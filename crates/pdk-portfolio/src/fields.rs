use serde::{Deserialize, Serialize};
use serde_json::Value;

use pdk_schemas::RawRecord;

use crate::numeric::safe_numeric;

/// Ordered list of venue-native keys that may carry one target field.
///
/// The first key whose value is present, not `null` and not an empty string
/// wins; later keys are fallbacks (e.g. `total_equity` then `totalEquity`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCandidates(Vec<String>);

impl FieldCandidates {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First usable value for this field, if any candidate carries one.
    pub fn lookup<'a>(&self, record: &'a RawRecord) -> Option<&'a Value> {
        self.0
            .iter()
            .filter_map(|k| record.get(k))
            .find(|v| is_usable(v))
    }

    /// Numeric read through [`safe_numeric`]; missing or malformed gives `default`.
    pub fn read_f64(&self, record: &RawRecord, default: f64) -> f64 {
        safe_numeric(self.lookup(record), default)
    }

    /// String read; non-string values are treated as missing.
    pub fn read_str<'a>(&self, record: &'a RawRecord) -> Option<&'a str> {
        self.lookup(record).and_then(Value::as_str)
    }
}

impl From<&[&str]> for FieldCandidates {
    fn from(keys: &[&str]) -> Self {
        Self::new(keys.iter().copied())
    }
}

fn is_usable(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> RawRecord {
        pdk_schemas::as_record(v).unwrap()
    }

    #[test]
    fn first_present_candidate_wins() {
        let f = FieldCandidates::from(&["total_equity", "totalEquity"][..]);
        let r = rec(json!({"total_equity": "10", "totalEquity": "20"}));
        assert_eq!(f.read_f64(&r, 0.0), 10.0);
    }

    #[test]
    fn null_and_empty_fall_through_to_next_candidate() {
        let f = FieldCandidates::from(&["total_equity", "totalEquity"][..]);
        assert_eq!(
            f.read_f64(&rec(json!({"total_equity": null, "totalEquity": "20"})), 0.0),
            20.0
        );
        assert_eq!(
            f.read_f64(&rec(json!({"total_equity": "", "totalEquity": 30})), 0.0),
            30.0
        );
    }

    #[test]
    fn no_candidate_gives_default() {
        let f = FieldCandidates::from(&["a", "b"][..]);
        assert_eq!(f.read_f64(&rec(json!({"c": 1})), -1.0), -1.0);
        assert!(f.read_str(&rec(json!({"a": 5}))).is_none());
    }

    #[test]
    fn deserializes_from_plain_list() {
        let f: FieldCandidates = serde_json::from_value(json!(["x", "y"])).unwrap();
        assert_eq!(f.keys(), ["x".to_string(), "y".to_string()]);
    }
}
