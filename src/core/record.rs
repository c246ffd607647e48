//! Record traits defining what the engine needs from a collection item

use crate::core::error::ViewError;
use crate::core::field::FieldValue;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base trait for anything displayed in a collection view.
///
/// A record has:
/// - id: a stable identifier, unique within one snapshot
/// - field values: scalars addressed by name, or by dotted path for nested
///   sub-records (`customer.name`)
pub trait Record: Clone + Send + Sync + 'static {
    /// Get the unique identifier for this record
    fn id(&self) -> &str;

    /// Get the value of a field by name or dotted path
    fn field_value(&self, path: &str) -> Option<FieldValue>;

    /// Texts searched by a free-text term
    ///
    /// The default reads each configured field. Records with dynamic fields
    /// may search every top-level scalar when `fields` is empty.
    fn search_texts(&self, fields: &[String]) -> Vec<String> {
        fields
            .iter()
            .filter_map(|f| self.field_value(f))
            .filter(|v| !v.is_null())
            .map(|v| v.to_text())
            .collect()
    }
}

/// A JSON-backed collection item
///
/// This is what the REST fetchers produce: an identifier plus the ordered
/// field map of the object returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub fields: IndexMap<String, Value>,
}

impl Item {
    /// Create an item from an id and a field map
    pub fn new(id: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build an item from a JSON object, reading the id from `id_field`
    ///
    /// Falls back to `_id` when `id_field` is absent. Numeric ids are
    /// normalized to strings.
    pub fn from_json(value: Value, id_field: &str) -> Result<Self, ViewError> {
        let Value::Object(map) = value else {
            return Err(ViewError::server(None, "collection entry is not a JSON object"));
        };

        let id = id_text(map.get(id_field))
            .or_else(|| id_text(map.get("_id")))
            .ok_or_else(|| {
                ViewError::server(None, format!("collection entry has no '{}' field", id_field))
            })?;

        Ok(Self {
            id,
            fields: map.into_iter().collect(),
        })
    }

    /// Raw JSON value at a dotted path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Convert back into a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Decode the item into a typed domain struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
        serde_json::from_value(self.to_json())
            .map_err(|e| ViewError::server(None, format!("failed to decode item '{}': {}", self.id, e)))
    }

    /// Overlay a partial update onto the top-level fields
    pub fn merge_patch(&mut self, patch: &Value) {
        if let Some(obj) = patch.as_object() {
            for (key, value) in obj {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

impl Record for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn field_value(&self, path: &str) -> Option<FieldValue> {
        self.get(path).and_then(FieldValue::from_json)
    }

    fn search_texts(&self, fields: &[String]) -> Vec<String> {
        if !fields.is_empty() {
            return fields
                .iter()
                .filter_map(|f| self.field_value(f))
                .filter(|v| !v.is_null())
                .map(|v| v.to_text())
                .collect();
        }

        self.fields
            .values()
            .filter_map(FieldValue::from_json)
            .filter(|v| !v.is_null())
            .map(|v| v.to_text())
            .collect()
    }
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
