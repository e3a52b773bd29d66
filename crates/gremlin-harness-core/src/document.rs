//! Sampled document helpers: normalization, emptiness, template merging.

use serde_json::Value;

use crate::models::Document;

/// Normalize raw sample rows into documents.
///
/// Text values holding JSON are replaced by the parsed value (also inside
/// arrays). Rows that are not objects become empty documents.
pub fn deserialize_documents(rows: Vec<Value>) -> Vec<Document> {
    rows.into_iter().map(deserialize_document).collect()
}

pub fn deserialize_document(row: Value) -> Document {
    match row {
        Value::Object(fields) => fields
            .into_iter()
            .map(|(name, value)| (name, deserialize_field(value)))
            .collect(),
        _ => Document::new(),
    }
}

fn deserialize_field(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Value::Array(items) => Value::Array(items.into_iter().map(deserialize_field).collect()),
        other => other,
    }
}

/// True when no sampled document carries any field.
pub fn is_empty_sample(documents: &[Document]) -> bool {
    documents.iter().all(|doc| doc.is_empty())
}

/// Deep-merge every document into `seed`, later documents winning on
/// scalar conflicts. Objects merge key by key and arrays merge by position.
pub fn merge_template(seed: Document, documents: &[Document]) -> Document {
    let mut template = Value::Object(seed);
    for doc in documents {
        for (name, value) in doc {
            merge_field(&mut template, name, value);
        }
    }
    match template {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn merge_field(target: &mut Value, name: &str, value: &Value) {
    if let Value::Object(map) = target {
        match map.get_mut(name) {
            Some(existing) => merge_value(existing, value),
            None => {
                map.insert(name.to_string(), value.clone());
            }
        }
    }
}

fn merge_value(target: &mut Value, source: &Value) {
    match source {
        Value::Object(fields) if target.is_object() => {
            for (name, value) in fields {
                merge_field(target, name, value);
            }
        }
        Value::Array(items) if target.is_array() => {
            if let Value::Array(existing) = target {
                for (i, item) in items.iter().enumerate() {
                    match existing.get_mut(i) {
                        Some(slot) => merge_value(slot, item),
                        None => existing.push(item.clone()),
                    }
                }
            }
        }
        _ => *target = source.clone(),
    }
}
