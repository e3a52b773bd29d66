//! Gremlin creation-script generation.
//!
//! Turns vertex/edge models plus their sample values into `g.addV(...)` and
//! `g.addE(...)` statements:
//!
//! ```text
//! g.addV("Person").
//!     property(single, "age", 30);
//!
//! g.addE("KNOWS").
//!     from(g.V().hasLabel("Person")).
//!     to(g.V().hasLabel("Person")).
//!     property("since", 2001);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::models::{Cardinality, FieldKind, FieldSchema, Mode, PropertyMap};

const GRAPH: &str = "g";
const INDENT: &str = "    ";
const DEFAULT_NAME: &str = "New_vertex";
const DIGIT_PREFIX: &str = "v_";
const SEPARATOR: &str = ";\n\n";

/// A vertex model as sent by the host application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexModel {
    #[serde(rename = "GUID", default)]
    pub guid: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// An edge model as sent by the host application. Parent and child refer to
/// vertex models by GUID.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModel {
    #[serde(rename = "GUID", default)]
    pub guid: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_collection: String,
    #[serde(default)]
    pub child_collection: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_string)))
}

/// Everything needed to script a whole container.
///
/// Models and data entries may each be given either as JSON objects or as
/// JSON text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerData {
    #[serde(default)]
    pub collections: Vec<Value>,
    #[serde(default)]
    pub relationships: Vec<Value>,
    #[serde(default)]
    pub json_data: Map<String, Value>,
}

/// Make `name` usable as a Gremlin label.
///
/// Missing or empty names fall back to `New_vertex`. Names starting with a
/// digit get the `v_` prefix plus a separator, i.e. `2cool` → `v__2cool`.
pub fn to_valid_name(name: Option<&str>) -> String {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return DEFAULT_NAME.to_string();
    };

    let sanitized: String = name
        .chars()
        .map(|c| if is_special(c) { '_' } else { c })
        .collect();

    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}_{}", DIGIT_PREFIX, sanitized)
    } else {
        sanitized
    }
}

fn is_special(c: char) -> bool {
    c.is_whitespace() || "`~!@#%^&*()_|+-=?;:'\",.<>{}[]\\/".contains(c)
}

fn quoted(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn entity_data(json_data: &Map<String, Value>, guid: &str) -> Result<Value> {
    match json_data.get(guid) {
        None => Ok(Value::Object(Map::new())),
        Some(Value::String(text)) => serde_json::from_str(text)
            .with_context(|| format!("Invalid JSON data for entity {}", guid)),
        Some(other) => Ok(other.clone()),
    }
}

pub fn generate_vertex(vertex: &VertexModel, data: &Value) -> String {
    let name = to_valid_name(vertex.collection_name.as_deref());
    let mut script = format!("{}.addV({})", GRAPH, quoted(&name));
    push_properties(&mut script, &vertex.properties, data, true);
    script
}

pub fn generate_vertices(vertices: &[VertexModel], json_data: &Map<String, Value>) -> Result<String> {
    let statements = vertices
        .iter()
        .map(|vertex| -> Result<String> {
            let data = entity_data(json_data, &vertex.guid)?;
            Ok(generate_vertex(vertex, &data))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(join_statements(&statements))
}

fn vertex_lookup(name: &str) -> String {
    format!("{}.V().hasLabel({})", GRAPH, quoted(name))
}

pub fn generate_edge(from: &str, to: &str, edge: &EdgeModel, data: &Value) -> String {
    let name = to_valid_name(edge.name.as_deref());
    let mut script = format!(
        "{}.addE({}).\n{}from({}).\n{}to({})",
        GRAPH,
        quoted(&name),
        INDENT,
        from,
        INDENT,
        to
    );
    push_properties(&mut script, &edge.properties, data, false);
    script
}

/// Edges whose parent or child vertex is not in `vertices` are skipped.
pub fn generate_edges(
    vertices: &[VertexModel],
    edges: &[EdgeModel],
    json_data: &Map<String, Value>,
) -> Result<String> {
    let mut statements = Vec::new();
    for edge in edges {
        let parent = vertices.iter().find(|v| v.guid == edge.parent_collection);
        let child = vertices.iter().find(|v| v.guid == edge.child_collection);
        let (Some(parent), Some(child)) = (parent, child) else {
            continue;
        };
        let from = vertex_lookup(&to_valid_name(parent.collection_name.as_deref()));
        let to = vertex_lookup(&to_valid_name(child.collection_name.as_deref()));
        let data = entity_data(json_data, &edge.guid)?;
        statements.push(generate_edge(&from, &to, edge, &data));
    }
    Ok(join_statements(&statements))
}

fn join_statements(statements: &[String]) -> String {
    if statements.is_empty() {
        return String::new();
    }
    format!("{};", statements.join(SEPARATOR))
}

fn parse_model<T: for<'de> Deserialize<'de>>(raw: &Value, what: &str) -> Result<T> {
    match raw {
        Value::String(text) => {
            serde_json::from_str(text).with_context(|| format!("Invalid {} model", what))
        }
        other => T::deserialize(other).with_context(|| format!("Invalid {} model", what)),
    }
}

/// Script every vertex, then every edge, separated by a blank line.
pub fn generate_container_script(data: &ContainerData) -> Result<String> {
    let vertices = data
        .collections
        .iter()
        .map(|raw| parse_model::<VertexModel>(raw, "collection"))
        .collect::<Result<Vec<_>>>()?;
    let edges = data
        .relationships
        .iter()
        .map(|raw| parse_model::<EdgeModel>(raw, "relationship"))
        .collect::<Result<Vec<_>>>()?;

    let mut script = generate_vertices(&vertices, &data.json_data)?;
    let edges_script = generate_edges(&vertices, &edges, &data.json_data)?;
    if !edges_script.is_empty() {
        script.push_str("\n\n");
        script.push_str(&edges_script);
    }
    Ok(script)
}

fn push_properties(script: &mut String, properties: &PropertyMap, data: &Value, cardinality: bool) {
    for (name, schema) in properties.iter() {
        push_property(script, schema, name, data.get(name), cardinality);
    }
}

fn push_property(
    script: &mut String,
    schema: &FieldSchema,
    name: &str,
    value: Option<&Value>,
    cardinality: bool,
) {
    if schema.kind == Some(FieldKind::MultiProperty) {
        let empty = Value::String(String::new());
        for (i, item) in schema.items.iter().flatten().enumerate() {
            let item = FieldSchema {
                prop_cardinality: Some(Cardinality::Set),
                ..item.clone()
            };
            let item_value = value
                .and_then(Value::as_array)
                .and_then(|values| values.get(i))
                .filter(|v| is_truthy(v))
                .unwrap_or(&empty);
            push_property(script, &item, name, Some(item_value), cardinality);
        }
        return;
    }

    let literal = format_literal(schema, value);
    let cardinality = if cardinality {
        let token = schema.prop_cardinality.unwrap_or(Cardinality::Single);
        format!("{}, ", token.as_str())
    } else {
        String::new()
    };
    script.push_str(&format!(
        ".\n{}property({}{}, {})",
        INDENT,
        cardinality,
        quoted(name),
        literal
    ));
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a property value as a Gremlin literal. A missing value renders as
/// an empty text literal.
fn format_literal(schema: &FieldSchema, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return match schema.kind {
            Some(FieldKind::Date) => "datetime(\"\")".to_string(),
            _ => quoted(""),
        };
    };

    match schema.kind {
        Some(FieldKind::Date) => {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("datetime(\"{}\")", text)
        }
        Some(FieldKind::Number) => {
            let suffix = match schema.mode {
                Some(Mode::Double) => "d",
                Some(Mode::Float) => "f",
                Some(Mode::Long) => "l",
                _ => "",
            };
            format!("{}{}", value, suffix)
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vertex(value: Value) -> VertexModel {
        serde_json::from_value(value).unwrap()
    }

    fn data(entries: Value) -> Map<String, Value> {
        entries.as_object().cloned().unwrap()
    }

    #[test]
    fn test_to_valid_name() {
        assert_eq!(to_valid_name(None), "New_vertex");
        assert_eq!(to_valid_name(Some("")), "New_vertex");
        assert_eq!(to_valid_name(Some("2cool")), "v__2cool");
        assert_eq!(to_valid_name(Some("My Label!")), "My_Label_");
        assert_eq!(to_valid_name(Some("a-b.c{d}")), "a_b_c_d_");
        assert_eq!(to_valid_name(Some("price$")), "price$");
    }

    #[test]
    fn test_non_text_name_falls_back() {
        let v = vertex(json!({ "GUID": "1", "collectionName": 42 }));
        assert_eq!(generate_vertex(&v, &json!({})), "g.addV(\"New_vertex\")");
    }

    #[test]
    fn test_single_vertex_with_integer() {
        let v = vertex(json!({
            "GUID": "p",
            "collectionName": "Person",
            "properties": { "age": { "type": "number", "mode": "integer" } }
        }));
        let script = generate_vertices(&[v], &data(json!({ "p": "{\"age\": 30}" }))).unwrap();
        assert_eq!(script, "g.addV(\"Person\").\n    property(single, \"age\", 30);");
    }

    #[test]
    fn test_literals_by_type() {
        let v = vertex(json!({
            "GUID": "t",
            "collectionName": "T",
            "properties": {
                "d": { "type": "number", "mode": "double" },
                "f": { "type": "number", "mode": "float" },
                "l": { "type": "number", "mode": "long" },
                "when": { "type": "date" },
                "name": { "type": "string", "propCardinality": "list" },
                "missing": { "type": "string" }
            }
        }));
        let script = generate_vertex(
            &v,
            &json!({ "d": 1.5, "f": 2.5, "l": 7, "when": "2020-01-01T00:00:00", "name": "Ann" }),
        );
        assert_eq!(
            script,
            "g.addV(\"T\").\n    property(single, \"d\", 1.5d).\n    property(single, \"f\", 2.5f).\n    property(single, \"l\", 7l).\n    property(single, \"when\", datetime(\"2020-01-01T00:00:00\")).\n    property(list, \"name\", \"Ann\").\n    property(single, \"missing\", \"\")"
        );
    }

    #[test]
    fn test_multi_property_forces_set() {
        let v = vertex(json!({
            "GUID": "m",
            "collectionName": "M",
            "properties": {
                "tags": {
                    "type": "multi-property",
                    "items": [{ "type": "string" }, { "type": "number", "mode": "long" }, { "type": "string" }]
                }
            }
        }));
        let script = generate_vertex(&v, &json!({ "tags": ["a", 5] }));
        assert_eq!(
            script,
            "g.addV(\"M\").\n    property(set, \"tags\", \"a\").\n    property(set, \"tags\", 5l).\n    property(set, \"tags\", \"\")"
        );
    }

    #[test]
    fn test_empty_input_is_empty_script() {
        assert_eq!(generate_vertices(&[], &Map::new()).unwrap(), "");
        assert_eq!(generate_edges(&[], &[], &Map::new()).unwrap(), "");
    }

    #[test]
    fn test_edges_skip_unknown_endpoints() {
        let person = vertex(json!({ "GUID": "p", "collectionName": "Person" }));
        let city = vertex(json!({ "GUID": "c", "collectionName": "2nd City" }));
        let edges: Vec<EdgeModel> = serde_json::from_value(json!([
            {
                "GUID": "e1",
                "name": "LIVES IN",
                "parentCollection": "p",
                "childCollection": "c",
                "properties": { "since": { "type": "number", "mode": "integer", "propCardinality": "set" } }
            },
            { "GUID": "e2", "name": "GHOST", "parentCollection": "p", "childCollection": "zz" }
        ]))
        .unwrap();
        let script = generate_edges(
            &[person, city],
            &edges,
            &data(json!({ "e1": { "since": 2001 } })),
        )
        .unwrap();
        assert_eq!(
            script,
            "g.addE(\"LIVES_IN\").\n    from(g.V().hasLabel(\"Person\")).\n    to(g.V().hasLabel(\"v__2nd_City\")).\n    property(\"since\", 2001);"
        );
    }

    #[test]
    fn test_container_script_joins_vertices_and_edges() {
        let container: ContainerData = serde_json::from_value(json!({
            "collections": [
                "{\"GUID\":\"a\",\"collectionName\":\"A\"}",
                { "GUID": "b", "collectionName": "B" }
            ],
            "relationships": [
                { "GUID": "r", "name": "R", "parentCollection": "a", "childCollection": "b" }
            ],
            "jsonData": { "a": "{}", "b": "{}", "r": "{}" }
        }))
        .unwrap();
        let script = generate_container_script(&container).unwrap();
        assert_eq!(
            script,
            "g.addV(\"A\");\n\ng.addV(\"B\");\n\ng.addE(\"R\").\n    from(g.V().hasLabel(\"A\")).\n    to(g.V().hasLabel(\"B\"));"
        );
    }

    #[test]
    fn test_invalid_json_data_is_an_error() {
        let v = vertex(json!({ "GUID": "x", "collectionName": "X" }));
        let err = generate_vertices(&[v], &data(json!({ "x": "{not json" }))).unwrap_err();
        assert!(err.to_string().contains("x"));
    }
}
