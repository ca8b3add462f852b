//! Conversions between raw index rows and domain types.
//!
//! Every index implementation hands back [`RawRow`]s; this module is the only
//! place that interprets them.

use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::error::{VectorError, VectorResult};
use crate::models::{Entity, ID_FIELD, NewEntity, SearchHit, TEXT_FIELD, VECTOR_FIELD};
use crate::repository::RawRow;

/// Field carrying the similarity/distance on search hits
pub const DISTANCE_FIELD: &str = "distance";

// ===== Ids =====

/// Primary keys arrive as JSON numbers, or as strings when the server guards
/// against 64-bit precision loss.
pub fn id_from_value(value: &Value) -> VectorResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| VectorError::Internal(format!("Non-integer id: {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| VectorError::Internal(format!("Non-integer id: {}", s))),
        other => Err(VectorError::Internal(format!("Invalid id: {}", other))),
    }
}

fn field_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ===== Search Hits =====

/// Convert one raw search row into a [`SearchHit`], keeping only the requested
/// output fields in `entity`.
pub fn hit_from_row(row: &RawRow, output_fields: &[String]) -> VectorResult<SearchHit> {
    let id = row
        .get(ID_FIELD)
        .ok_or_else(|| VectorError::Internal("Search hit without id".to_string()))
        .and_then(id_from_value)?;

    let distance = row
        .get(DISTANCE_FIELD)
        .and_then(Value::as_f64)
        .ok_or_else(|| VectorError::Internal(format!("Search hit {} without distance", id)))?
        as f32;

    // Older servers nest output fields under `entity`.
    let fields = match row.get("entity") {
        Some(Value::Object(nested)) => nested,
        _ => row,
    };

    let entity: BTreeMap<String, String> = output_fields
        .iter()
        .filter_map(|name| fields.get(name).map(|v| (name.clone(), field_to_string(v))))
        .collect();

    Ok(SearchHit {
        id,
        distance,
        entity,
    })
}

// ===== Entities =====

pub fn entity_from_row(row: &RawRow) -> VectorResult<Entity> {
    let id = row
        .get(ID_FIELD)
        .ok_or_else(|| VectorError::Internal("Entity without id".to_string()))
        .and_then(id_from_value)?;

    let text = row
        .get(TEXT_FIELD)
        .map(field_to_string)
        .unwrap_or_default();

    let vector = match row.get(VECTOR_FIELD) {
        Some(Value::Array(values)) => Some(
            values
                .iter()
                .map(|v| {
                    v.as_f64().map(|f| f as f32).ok_or_else(|| {
                        VectorError::Internal(format!("Entity {} has a non-numeric vector", id))
                    })
                })
                .collect::<VectorResult<Vec<f32>>>()?,
        ),
        _ => None,
    };

    Ok(Entity { id, text, vector })
}

/// Row shape written by `entities/insert`
pub fn row_from_entity(entity: &NewEntity) -> Value {
    json!({
        ID_FIELD: entity.id,
        VECTOR_FIELD: entity.vector,
        TEXT_FIELD: entity.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_id_from_number_and_string() {
        assert_eq!(id_from_value(&json!(7)).unwrap(), 7);
        assert_eq!(
            id_from_value(&json!("449568215683543173")).unwrap(),
            449568215683543173
        );
        assert!(id_from_value(&json!(1.5)).is_err());
        assert!(id_from_value(&json!(null)).is_err());
    }

    #[test]
    fn test_hit_from_flat_row() {
        let raw = row(json!({"id": 1, "distance": 0.12, "text": "name: OrderNbr"}));
        let hit = hit_from_row(&raw, &[TEXT_FIELD.to_string()]).unwrap();

        assert_eq!(hit.id, 1);
        assert!((hit.distance - 0.12).abs() < 1e-6);
        assert_eq!(hit.text(), Some("name: OrderNbr"));
    }

    #[test]
    fn test_hit_from_nested_entity() {
        let raw = row(json!({"id": "7", "distance": 0.34, "entity": {"text": "t"}}));
        let hit = hit_from_row(&raw, &[TEXT_FIELD.to_string()]).unwrap();

        assert_eq!(hit.id, 7);
        assert_eq!(hit.text(), Some("t"));
    }

    #[test]
    fn test_hit_keeps_only_requested_fields() {
        let raw = row(json!({"id": 1, "distance": 0.5, "text": "t", "embeddings": [0.1]}));
        let hit = hit_from_row(&raw, &[TEXT_FIELD.to_string()]).unwrap();
        assert_eq!(hit.entity.len(), 1);
    }

    #[test]
    fn test_hit_without_distance_is_an_error() {
        let raw = row(json!({"id": 1, "text": "t"}));
        assert!(hit_from_row(&raw, &[]).is_err());
    }

    #[test]
    fn test_entity_round_trip_through_row() {
        let new = NewEntity {
            id: 3,
            vector: vec![0.25, 0.5],
            text: "hello".into(),
        };

        let Value::Object(raw) = row_from_entity(&new) else {
            panic!("expected object");
        };
        let entity = entity_from_row(&raw).unwrap();

        assert_eq!(entity.id, 3);
        assert_eq!(entity.text, "hello");
        assert_eq!(entity.vector, Some(vec![0.25, 0.5]));
    }
}
