//! Allow-list filtering for free-form schema and rule records.
//!
//! Schema fields and validation rules are edited as raw JSON objects, so a
//! record can carry attributes the model does not know about. Filtering
//! partitions a record into the recognized attributes and an opaque extras
//! bag; merging restores the original key/value set. Extra attributes are
//! never validated and never dropped.

use indexmap::IndexMap;
use serde_json::Value;

/// Reserved key under which unrecognized attributes travel once a record has
/// been filtered. The consistency checks skip this key.
pub const EXTRAS_KEY: &str = "_extras";

/// An order-preserving JSON object, the unit of schema/rule editing.
pub type Record = IndexMap<String, Value>;

/// A record partitioned into recognized attributes and everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRecord {
    pub known: Record,
    pub extras: Record,
}

/// Partition `record` into attributes named in `allowed` and an extras bag.
///
/// A pre-existing extras bag (the [`EXTRAS_KEY`] entry) is flattened into the
/// new one, so filtering an already-filtered record does not nest bags.
pub fn split(record: &Record, allowed: &[&str]) -> FilteredRecord {
    let mut known = Record::new();
    let mut extras = Record::new();

    for (key, value) in record {
        if key == EXTRAS_KEY {
            if let Some(bag) = value.as_object() {
                for (k, v) in bag {
                    extras.insert(k.clone(), v.clone());
                }
            } else if !value.is_null() {
                extras.insert(key.clone(), value.clone());
            }
        } else if allowed.contains(&key.as_str()) {
            known.insert(key.clone(), value.clone());
        } else {
            extras.insert(key.clone(), value.clone());
        }
    }

    FilteredRecord { known, extras }
}

/// Reassemble a filtered record into a flat object with the full original
/// key/value set: recognized attributes first, extras after.
pub fn merge(filtered: &FilteredRecord) -> Record {
    let mut record = filtered.known.clone();
    for (key, value) in &filtered.extras {
        record.insert(key.clone(), value.clone());
    }
    record
}

/// Collapse a record to its allow-listed attributes, tucking everything else
/// under [`EXTRAS_KEY`]. The bag is omitted when there is nothing to keep.
pub fn apply(record: &Record, allowed: &[&str]) -> Record {
    let filtered = split(record, allowed);
    let mut out = filtered.known;
    if !filtered.extras.is_empty() {
        let bag: serde_json::Map<String, Value> = filtered
            .extras
            .into_iter()
            .collect();
        out.insert(EXTRAS_KEY.to_string(), Value::Object(bag));
    }
    out
}

/// View a JSON value as a record, if it is an object.
pub fn as_record(value: &Value) -> Option<Record> {
    value.as_object().map(|map| {
        map.iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        as_record(&value).expect("object")
    }

    #[test]
    fn split_partitions_by_allow_list() {
        let rec = record(json!({"name": "age", "color": "red", "required": true}));
        let filtered = split(&rec, &["name", "required"]);

        assert_eq!(filtered.known.len(), 2);
        assert_eq!(filtered.extras.len(), 1);
        assert_eq!(filtered.extras["color"], json!("red"));
    }

    #[test]
    fn merge_after_split_is_identity_on_keys_and_values() {
        let rec = record(json!({
            "name": "price",
            "data_type": "number",
            "note": "legacy column",
            "owner": {"team": "billing"}
        }));
        let merged = merge(&split(&rec, &["name", "data_type"]));

        assert_eq!(merged.len(), rec.len());
        for (key, value) in &rec {
            assert_eq!(merged.get(key), Some(value));
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let rec = record(json!({"name": "age", "color": "red"}));
        let once = apply(&rec, &["name"]);
        let twice = apply(&once, &["name"]);

        assert_eq!(once, twice);
        assert_eq!(once[EXTRAS_KEY], json!({"color": "red"}));
    }

    #[test]
    fn apply_omits_empty_bag() {
        let rec = record(json!({"name": "age"}));
        let applied = apply(&rec, &["name"]);
        assert!(!applied.contains_key(EXTRAS_KEY));
    }
}
