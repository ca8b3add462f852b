//! Data-dictionary documents: per-table column metadata fed to ingestion.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{VectorError, VectorResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub column_type: String,
    /// Rendered as `None` when absent or null
    #[serde(default)]
    pub description: Option<String>,
    pub number_of_rows: i64,
    pub null_rows: i64,
    pub distinct_rows: i64,
    /// Sample values; scalars or null
    #[serde(default, deserialize_with = "null_as_empty")]
    pub examples: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDictionaryDocument {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl DataDictionaryDocument {
    /// `catalog.schema.table`
    pub fn qualified_table(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// Parse one file's worth of documents.
///
/// Accepts a single document, an array of documents, or an object wrapping
/// the array under `data`.
pub fn parse_documents(bytes: &[u8]) -> VectorResult<Vec<DataDictionaryDocument>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| VectorError::Validation(format!("Invalid JSON document: {}", e)))?;

    let value = match value {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_array) => map
            .remove("data")
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };

    let parsed = match value {
        Value::Array(_) => serde_json::from_value::<Vec<DataDictionaryDocument>>(value),
        single => serde_json::from_value::<DataDictionaryDocument>(single).map(|doc| vec![doc]),
    };

    parsed.map_err(|e| VectorError::Validation(format!("Invalid data dictionary: {}", e)))
}
