//! Schema synthesis from sampled documents and constraints.
//!
//! Constraints seed the model first (`EXISTS` → `required`, `UNIQUE` →
//! `unique: true`), then documents are folded in order. The first document
//! that introduces a field fixes its shape; later documents never change it.
//! A `UNIQUE` key is already present before folding, so it is never typed.
//!
//! Folding also cleans the documents kept as samples: spatial values are
//! schema-only and are dropped, and numeric/spatial array elements are moved
//! out of the array into the field's `items`.

use serde_json::{Number, Value};

use crate::models::{
    ConstraintRecord, ConstraintType, Document, FieldKind, FieldSchema, Mode, PropertyMap,
    SchemaModel,
};
use crate::spatial;

/// Constraints split by type.
#[derive(Debug, Default)]
pub struct ConstraintBuckets<'a> {
    pub unique: Vec<&'a ConstraintRecord>,
    pub exists: Vec<&'a ConstraintRecord>,
    pub node_key: Vec<&'a ConstraintRecord>,
}

pub fn partition(constraints: &[ConstraintRecord]) -> ConstraintBuckets<'_> {
    let mut buckets = ConstraintBuckets::default();
    for constraint in constraints {
        match constraint.kind {
            ConstraintType::Unique => buckets.unique.push(constraint),
            ConstraintType::Exists => buckets.exists.push(constraint),
            ConstraintType::NodeKey => buckets.node_key.push(constraint),
        }
    }
    buckets
}

/// The synthesized model together with the cleaned sample documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub schema: SchemaModel,
    pub documents: Vec<Document>,
}

pub fn synthesize(documents: Vec<Document>, constraints: &[ConstraintRecord]) -> Synthesis {
    synthesize_seeded(documents, constraints, &PropertyMap::new())
}

/// Like [`synthesize`], with field shapes already known from typed decoding
/// declared ahead of the documents.
pub fn synthesize_seeded(
    documents: Vec<Document>,
    constraints: &[ConstraintRecord],
    seed: &PropertyMap,
) -> Synthesis {
    let buckets = partition(constraints);

    let required: Vec<String> = buckets
        .exists
        .iter()
        .flat_map(|c| c.key.iter().cloned())
        .collect();

    let mut properties = PropertyMap::new();
    for constraint in &buckets.unique {
        for key in &constraint.key {
            properties.mark_unique(key);
        }
    }
    for (name, schema) in seed.iter() {
        properties.declare(name, schema.clone());
    }

    let documents = documents
        .into_iter()
        .map(|doc| fold_document(doc, &mut properties))
        .collect();

    Synthesis {
        schema: SchemaModel {
            required,
            properties,
        },
        documents,
    }
}

fn fold_document(document: Document, properties: &mut PropertyMap) -> Document {
    let mut kept = Document::new();

    for (name, value) in document {
        match value {
            Value::Array(elements) => {
                let (rest, items) = split_array(elements);
                if !items.is_empty() {
                    properties.declare(&name, FieldSchema::list(items));
                }
                kept.insert(name, Value::Array(rest));
            }
            Value::Object(object) => {
                if let Some(descriptor) = spatial_descriptor(&object) {
                    properties.declare(&name, descriptor.to_field_schema());
                } else if properties.contains_key(&name) {
                    kept.insert(name, Value::Object(object));
                } else {
                    let mut nested = PropertyMap::new();
                    let cleaned = fold_document(object, &mut nested);
                    properties.declare(&name, FieldSchema::nested(FieldKind::Map, nested));
                    kept.insert(name, Value::Object(cleaned));
                }
            }
            Value::Number(number) => {
                properties.declare(&name, number_schema(&number));
                kept.insert(name, Value::Number(number));
            }
            other => {
                kept.insert(name, other);
            }
        }
    }

    kept
}

/// Separate typed (numeric, spatial, nested array) elements from the rest.
///
/// Returns the elements kept as sample data and the extracted item schemas.
/// Nested arrays stay in the sample (cleaned) and also contribute a `list`
/// item.
pub fn split_array(elements: Vec<Value>) -> (Vec<Value>, Vec<FieldSchema>) {
    let mut rest = Vec::new();
    let mut items = Vec::new();

    for element in elements {
        match element {
            Value::Number(number) => items.push(number_schema(&number)),
            Value::Array(inner) => {
                let (inner_rest, inner_items) = split_array(inner);
                items.push(FieldSchema::list(inner_items));
                rest.push(Value::Array(inner_rest));
            }
            Value::Object(object) => match spatial_descriptor(&object) {
                Some(descriptor) => items.push(descriptor.to_field_schema()),
                None => rest.push(Value::Object(object)),
            },
            other => rest.push(other),
        }
    }

    (rest, items)
}

fn number_schema(number: &Number) -> FieldSchema {
    let whole = number.is_i64()
        || number.is_u64()
        || number.as_f64().is_some_and(|f| f.fract() == 0.0);
    let mode = if whole { Mode::Integer } else { Mode::Float };
    FieldSchema::number(mode, Some(Value::Number(number.clone())))
}

fn spatial_descriptor(object: &Document) -> Option<&'static spatial::SpatialTypeDescriptor> {
    let srid = match object.get("srid")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    spatial::resolve(srid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn constraint(kind: ConstraintType, key: &[&str]) -> ConstraintRecord {
        ConstraintRecord {
            name: "c".to_string(),
            kind,
            key: key.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn test_required_is_concatenated_exists_keys() {
        let constraints = vec![
            constraint(ConstraintType::Exists, &["name"]),
            constraint(ConstraintType::Unique, &["email"]),
            constraint(ConstraintType::Exists, &["name", "ghost"]),
        ];
        let result = synthesize(vec![doc(json!({ "age": 3 }))], &constraints);
        assert_eq!(result.schema.required, vec!["name", "name", "ghost"]);
        assert!(!result.schema.properties.contains_key("ghost"));
    }

    #[test]
    fn test_unique_field_is_not_classified() {
        let constraints = vec![constraint(ConstraintType::Unique, &["code", "home", "tags"])];
        let result = synthesize(
            vec![doc(json!({
                "code": 12,
                "home": { "srid": 4326, "x": 1.0, "y": 2.0 },
                "tags": [1, "a"]
            }))],
            &constraints,
        );
        assert_eq!(
            serde_json::to_value(&result.schema.properties).unwrap(),
            json!({
                "code": { "unique": true },
                "home": { "unique": true },
                "tags": { "unique": true }
            })
        );
        assert_eq!(result.documents[0], doc(json!({ "code": 12, "tags": ["a"] })));
    }

    #[test]
    fn test_first_document_fixes_kind() {
        let result = synthesize(
            vec![
                doc(json!({ "v": 1.5, "w": { "a": 1 } })),
                doc(json!({ "v": { "nested": true }, "w": 2 })),
            ],
            &[],
        );
        let props = &result.schema.properties;
        assert_eq!(props.get("v").unwrap().kind, Some(FieldKind::Number));
        assert_eq!(props.get("v").unwrap().mode, Some(Mode::Float));
        assert_eq!(props.get("w").unwrap().kind, Some(FieldKind::Map));
    }

    #[test]
    fn test_text_and_bool_have_no_schema() {
        let result = synthesize(
            vec![doc(json!({ "name": "Ann", "active": true, "none": null }))],
            &[],
        );
        assert!(result.schema.properties.is_empty());
        assert_eq!(result.documents[0].len(), 3);
    }

    #[test]
    fn test_spatial_field_is_resolved_and_removed() {
        let result = synthesize(
            vec![doc(json!({ "where": { "srid": 4326, "x": 1, "y": 2 }, "n": "a" }))],
            &[],
        );
        let spatial = result.schema.properties.get("where").unwrap();
        assert_eq!(spatial.kind, Some(FieldKind::Spatial));
        assert_eq!(spatial.sub_type.as_deref(), Some("WGS-84"));
        assert!(!result.documents[0].contains_key("where"));
        assert!(result.documents[0].contains_key("n"));
    }

    #[test]
    fn test_unknown_srid_is_plain_object() {
        let result = synthesize(vec![doc(json!({ "p": { "srid": 1, "x": 2 } }))], &[]);
        let p = result.schema.properties.get("p").unwrap();
        assert_eq!(p.kind, Some(FieldKind::Map));
        assert!(p.properties.as_ref().unwrap().contains_key("x"));
        assert!(result.documents[0].contains_key("p"));
    }

    #[test]
    fn test_fractional_srid_is_plain_object() {
        let result = synthesize(vec![doc(json!({ "p": { "srid": 4326.7, "x": 1 } }))], &[]);
        let p = result.schema.properties.get("p").unwrap();
        assert_eq!(p.kind, Some(FieldKind::Map));
        assert!(result.documents[0].contains_key("p"));

        let whole = synthesize(vec![doc(json!({ "p": { "srid": 4326.0, "x": 1 } }))], &[]);
        let p = whole.schema.properties.get("p").unwrap();
        assert_eq!(p.kind, Some(FieldKind::Spatial));
        assert_eq!(p.sub_type.as_deref(), Some("WGS-84"));
    }

    #[test]
    fn test_array_items_are_extracted() {
        let result = synthesize(
            vec![doc(json!({
                "scores": [1, "keep", 2.5, { "srid": 7203, "x": 0, "y": 0 }, [3, "inner"]]
            }))],
            &[],
        );
        let scores = result.schema.properties.get("scores").unwrap();
        assert_eq!(scores.kind, Some(FieldKind::List));
        let items = scores.items.as_ref().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].mode, Some(Mode::Integer));
        assert_eq!(items[1].mode, Some(Mode::Float));
        assert_eq!(items[2].sub_type.as_deref(), Some("Cartesian"));
        assert_eq!(items[3].kind, Some(FieldKind::List));
        assert_eq!(
            Value::Object(result.documents[0].clone()),
            json!({ "scores": ["keep", ["inner"]] })
        );
    }

    #[test]
    fn test_text_only_array_has_no_schema() {
        let result = synthesize(vec![doc(json!({ "tags": ["a", "b"] }))], &[]);
        assert!(!result.schema.properties.contains_key("tags"));
        assert_eq!(result.documents[0]["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_nested_object_spatial_is_cleaned() {
        let result = synthesize(
            vec![doc(json!({ "addr": { "zip": 123, "geo": { "srid": 9157, "x": 1, "y": 1, "z": 1 } } }))],
            &[],
        );
        let addr = result.schema.properties.get("addr").unwrap();
        let nested = addr.properties.as_ref().unwrap();
        assert_eq!(nested.get("geo").unwrap().sub_type.as_deref(), Some("Cartesian 3D"));
        assert_eq!(result.documents[0]["addr"], json!({ "zip": 123 }));
    }

    #[test]
    fn test_seed_declares_before_documents() {
        let mut seed = PropertyMap::new();
        seed.declare("big", FieldSchema::number(Mode::Long, None));
        let result = synthesize_seeded(vec![doc(json!({ "big": 5 }))], &[], &seed);
        assert_eq!(
            result.schema.properties.get("big").unwrap().mode,
            Some(Mode::Long)
        );
    }

    #[test]
    fn test_resynthesis_is_idempotent() {
        let documents = vec![
            doc(json!({ "n": 1, "list": [1, 2], "m": { "k": 2.5 } })),
            doc(json!({ "n": 2.5, "list": [3.5], "m": { "k": 1 } })),
        ];
        let first = synthesize(documents.clone(), &[]);
        let reparsed: SchemaModel =
            serde_json::from_value(serde_json::to_value(&first.schema).unwrap()).unwrap();
        assert_eq!(reparsed, first.schema);
        let second = synthesize(documents, &[]);
        assert_eq!(second.schema, first.schema);
    }
}
