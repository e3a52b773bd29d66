//! GraphSON typed-result decoding.
//!
//! A typed result is either a bare JSON value or an envelope
//! `{"@type": "<tag>", "@value": <payload>}`. [`decode`] turns it into a
//! [`FieldSchema`]; [`to_plain`] strips the envelopes to recover the sample
//! value; [`decode_row`] does both for one `valueMap(true)` row.
//!
//! Decoding never fails. Shapes that are not understood degrade to `map`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{Cardinality, Document, FieldKind, FieldSchema, Mode, PropertyMap};

const TYPE_KEY: &str = "@type";
const VALUE_KEY: &str = "@value";

/// Token tag used by `valueMap(true)` for the `id`/`label` meta keys.
const TOKEN_TAG: &str = "g:T";

fn envelope(value: &Value) -> Option<(&str, &Value)> {
    let obj = value.as_object()?;
    let tag = obj.get(TYPE_KEY)?.as_str()?;
    Some((tag, obj.get(VALUE_KEY).unwrap_or(&Value::Null)))
}

fn scalar_type(tag: &str) -> (FieldKind, Option<Mode>) {
    match tag {
        "g:Double" => (FieldKind::Number, Some(Mode::Double)),
        "gx:Byte" => (FieldKind::Number, Some(Mode::Byte)),
        "gx:Int16" => (FieldKind::Number, Some(Mode::Short)),
        "g:Int32" => (FieldKind::Number, Some(Mode::Integer)),
        "g:Int64" => (FieldKind::Number, Some(Mode::Long)),
        "g:Float" => (FieldKind::Number, Some(Mode::Float)),
        "g:Date" => (FieldKind::Date, None),
        _ => (FieldKind::Map, None),
    }
}

fn native_kind(value: &Value) -> FieldKind {
    match value {
        Value::String(_) => FieldKind::String,
        Value::Bool(_) => FieldKind::Boolean,
        Value::Number(_) => FieldKind::Number,
        Value::Null => FieldKind::Null,
        Value::Array(_) | Value::Object(_) => FieldKind::Map,
    }
}

/// Decode one typed value into its field schema.
pub fn decode(value: &Value) -> FieldSchema {
    let Some((tag, payload)) = envelope(value) else {
        return match value {
            Value::Array(_) | Value::Object(_) => FieldSchema::of_kind(FieldKind::Map),
            scalar => FieldSchema {
                sample: Some(scalar.clone()).filter(|v| !v.is_null()),
                ..FieldSchema::of_kind(native_kind(scalar))
            },
        };
    };

    match tag {
        "g:Map" => FieldSchema::nested(FieldKind::Map, decode_map(payload)),
        "g:List" => decode_sequence(FieldKind::List, payload),
        "g:Set" => decode_sequence(FieldKind::Set, payload),
        _ => {
            let (kind, mode) = scalar_type(tag);
            let sample = sample_of(&kind, payload);
            FieldSchema {
                mode,
                sample,
                ..FieldSchema::of_kind(kind)
            }
        }
    }
}

/// Rebuild a `g:Map` payload (`[k0, v0, k1, v1, ...]`) into named schemas.
fn decode_map(payload: &Value) -> PropertyMap {
    let mut properties = PropertyMap::new();
    let Some(flat) = payload.as_array() else {
        return properties;
    };
    for pair in flat.chunks(2) {
        let key = key_text(&pair[0]);
        let schema = match pair.get(1) {
            Some(value) => decode(value),
            None => FieldSchema::of_kind(FieldKind::Map),
        };
        properties.declare(&key, schema);
    }
    properties
}

fn decode_sequence(kind: FieldKind, payload: &Value) -> FieldSchema {
    let Some(elements) = payload.as_array() else {
        return FieldSchema::of_kind(FieldKind::Map);
    };
    let mut items: Vec<FieldSchema> = elements.iter().map(decode).collect();
    match items.len() {
        0 => FieldSchema {
            items: Some(Vec::new()),
            ..FieldSchema::of_kind(kind)
        },
        1 => items.remove(0),
        _ => {
            let mut distinct: Vec<FieldSchema> = Vec::new();
            for item in items {
                if !distinct
                    .iter()
                    .any(|seen| seen.kind == item.kind && seen.mode == item.mode)
                {
                    distinct.push(item);
                }
            }
            if distinct.len() == 1 {
                FieldSchema {
                    prop_cardinality: Some(Cardinality::Set),
                    ..distinct.remove(0)
                }
            } else {
                FieldSchema {
                    items: Some(distinct),
                    prop_cardinality: Some(Cardinality::Set),
                    ..FieldSchema::of_kind(FieldKind::MultiProperty)
                }
            }
        }
    }
}

fn key_text(key: &Value) -> String {
    let raw = envelope(key).map(|(_, v)| v).unwrap_or(key);
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sample_of(kind: &FieldKind, payload: &Value) -> Option<Value> {
    if *kind == FieldKind::Date {
        return date_sample(payload).map(Value::String);
    }
    let sample = match payload {
        Value::Array(items) => items.first().cloned()?,
        other => other.clone(),
    };
    Some(sample).filter(|v| !v.is_null())
}

/// Render a GraphSON date payload (epoch millis or RFC 3339 text) as
/// `YYYY-MM-DDTHH:MM:SS` in UTC.
pub fn date_sample(payload: &Value) -> Option<String> {
    let moment: DateTime<Utc> = match payload {
        Value::Number(n) => DateTime::<Utc>::from_timestamp_millis(n.as_f64()? as i64)?,
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        _ => return None,
    };
    Some(moment.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Strip GraphSON envelopes, keeping plain JSON values.
pub fn to_plain(value: &Value) -> Value {
    if let Some((tag, payload)) = envelope(value) {
        return match tag {
            "g:Map" => {
                let mut out = Map::new();
                if let Some(flat) = payload.as_array() {
                    for pair in flat.chunks(2) {
                        let v = pair.get(1).map(to_plain).unwrap_or(Value::Null);
                        out.insert(key_text(&pair[0]), v);
                    }
                }
                Value::Object(out)
            }
            "g:List" | "g:Set" => match payload {
                Value::Array(items) => Value::Array(items.iter().map(to_plain).collect()),
                other => to_plain(other),
            },
            "g:Date" => date_sample(payload).map(Value::String).unwrap_or(Value::Null),
            _ => to_plain(payload),
        };
    }
    match value {
        Value::Array(items) => Value::Array(items.iter().map(to_plain).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), to_plain(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A `valueMap(true)` row decoded into a plain document and its typed shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRow {
    pub document: Document,
    pub properties: PropertyMap,
}

/// Decode one typed row. Token keys (`id`, `label`) are skipped and a
/// list-valued property contributes its first element to the document.
pub fn decode_row(row: &Value) -> DecodedRow {
    let mut decoded = DecodedRow::default();
    match envelope(row) {
        Some(("g:Map", payload)) => {
            let Some(flat) = payload.as_array() else {
                return decoded;
            };
            for pair in flat.chunks(2) {
                if matches!(envelope(&pair[0]), Some((TOKEN_TAG, _))) {
                    continue;
                }
                let Some(value) = pair.get(1) else { continue };
                let key = key_text(&pair[0]);
                decoded.properties.declare(&key, decode(value));
                decoded.document.insert(key, first_of(to_plain(value)));
            }
        }
        Some(_) => {}
        None => {
            if let Some(obj) = row.as_object() {
                decoded.document = obj.clone();
            }
        }
    }
    decoded
}

fn first_of(value: Value) -> Value {
    match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    }
}
