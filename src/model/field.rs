use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::allowlist::{self, Record};

/// Attributes the model recognizes on a schema field record. Anything else is
/// carried in the extras bag.
pub const FIELD_ALLOWED_KEYS: &[&str] = &[
    "name",
    "data_type",
    "required",
    "max_length",
    "allowed_values",
    "is_primary_key",
    "is_unique",
];

/// Closed set of column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Varchar,
    Integer,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::String,
        DataType::Number,
        DataType::Date,
        DataType::Varchar,
        DataType::Integer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Varchar => "varchar",
            DataType::Integer => "integer",
        }
    }

    pub fn parse(value: &str) -> Option<DataType> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }

    /// Whether values of this type are numeric once materialized.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Number | DataType::Integer)
    }
}

/// One column's declared shape, derived from a validated schema record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_unique: bool,
}

impl FieldDefinition {
    /// Build a typed definition from a raw record, reading only recognized
    /// attributes. Missing optional attributes take their defaults.
    pub fn from_record(record: &Record) -> Result<FieldDefinition, String> {
        let filtered = allowlist::split(record, FIELD_ALLOWED_KEYS);
        let known = &filtered.known;

        let name = known
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "field record has no \"name\"".to_string())?
            .to_lowercase();

        let data_type = known
            .get("data_type")
            .and_then(Value::as_str)
            .and_then(DataType::parse)
            .ok_or_else(|| format!("field \"{}\" has an unsupported data type", name))?;

        Ok(FieldDefinition {
            name,
            data_type,
            required: known.get("required").and_then(Value::as_bool).unwrap_or(false),
            max_length: known
                .get("max_length")
                .and_then(Value::as_u64)
                .map(|v| v as u32),
            allowed_values: known
                .get("allowed_values")
                .and_then(Value::as_array)
                .cloned(),
            is_primary_key: known
                .get("is_primary_key")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            is_unique: known
                .get("is_unique")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

/// Ensure every recognized attribute is present on a loaded schema record,
/// then collapse unrecognized ones into the extras bag. Loaded projects get a
/// stable editor shape this way, whatever the collaborator sent.
pub fn normalize_field_record(record: &Record) -> Record {
    let mut normalized = Record::new();
    normalized.insert(
        "name".into(),
        record.get("name").cloned().unwrap_or_else(|| Value::String(String::new())),
    );
    normalized.insert(
        "data_type".into(),
        record
            .get("data_type")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    );
    normalized.insert(
        "required".into(),
        record.get("required").cloned().unwrap_or(Value::Bool(false)),
    );
    normalized.insert(
        "max_length".into(),
        record.get("max_length").cloned().unwrap_or(Value::Null),
    );
    normalized.insert(
        "allowed_values".into(),
        record.get("allowed_values").cloned().unwrap_or(Value::Null),
    );
    normalized.insert(
        "is_primary_key".into(),
        record.get("is_primary_key").cloned().unwrap_or(Value::Bool(false)),
    );
    normalized.insert(
        "is_unique".into(),
        record.get("is_unique").cloned().unwrap_or(Value::Bool(false)),
    );

    for (key, value) in record {
        if !FIELD_ALLOWED_KEYS.contains(&key.as_str()) {
            normalized.insert(key.clone(), value.clone());
        }
    }

    allowlist::apply(&normalized, FIELD_ALLOWED_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::allowlist::as_record;
    use serde_json::json;

    #[test]
    fn data_type_round_trips_through_names() {
        for data_type in DataType::ALL {
            assert_eq!(DataType::parse(data_type.as_str()), Some(data_type));
        }
        assert_eq!(DataType::parse("decimal"), None);
    }

    #[test]
    fn from_record_reads_known_attributes_only() {
        let record = as_record(&json!({
            "name": "Age",
            "data_type": "integer",
            "required": true,
            "source_system": "legacy"
        }))
        .unwrap();

        let field = FieldDefinition::from_record(&record).expect("valid field");
        assert_eq!(field.name, "age");
        assert_eq!(field.data_type, DataType::Integer);
        assert!(field.required);
        assert!(!field.is_primary_key);
    }

    #[test]
    fn from_record_rejects_missing_name_and_bad_type() {
        let no_name = as_record(&json!({"data_type": "string"})).unwrap();
        assert!(FieldDefinition::from_record(&no_name).is_err());

        let bad_type = as_record(&json!({"name": "x", "data_type": "decimal"})).unwrap();
        assert!(FieldDefinition::from_record(&bad_type).is_err());
    }

    #[test]
    fn normalize_fills_defaults_and_keeps_extras() {
        let record = as_record(&json!({"name": "age", "note": "kept"})).unwrap();
        let normalized = normalize_field_record(&record);

        assert_eq!(normalized["required"], json!(false));
        assert_eq!(normalized["max_length"], Value::Null);
        assert_eq!(normalized[allowlist::EXTRAS_KEY], json!({"note": "kept"}));
    }
}
