//! Core data models shared by the reverse- and forward-engineering paths.
//!
//! The JSON shape of these types is the exchange format with the host
//! application: field schemas serialize as `{type, mode, subType, sample,
//! properties, items, unique, propCardinality}`, packages use camelCase keys.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A sampled vertex or edge, keyed by property name.
pub type Document = Map<String, Value>;

/// Declared shape of a field.
///
/// Native JSON kinds (`string`, `boolean`, `null`) only appear for untyped
/// GraphSON scalars; anything the host sends that is not known here is kept
/// verbatim in [`FieldKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    String,
    Boolean,
    Null,
    Number,
    Date,
    Spatial,
    List,
    Set,
    Map,
    MultiProperty,
    Other(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Null => "null",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Spatial => "spatial",
            FieldKind::List => "list",
            FieldKind::Set => "set",
            FieldKind::Map => "map",
            FieldKind::MultiProperty => "multi-property",
            FieldKind::Other(s) => s,
        }
    }
}

impl From<String> for FieldKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "string" => FieldKind::String,
            "boolean" => FieldKind::Boolean,
            "null" => FieldKind::Null,
            "number" => FieldKind::Number,
            "date" => FieldKind::Date,
            "spatial" => FieldKind::Spatial,
            "list" => FieldKind::List,
            "set" => FieldKind::Set,
            "map" => FieldKind::Map,
            "multi-property" => FieldKind::MultiProperty,
            _ => FieldKind::Other(s),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Numeric width of a `number` field, or `point` for spatial fields.
///
/// Modes this crate does not know are kept verbatim in [`Mode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    Integer,
    Float,
    Double,
    Byte,
    Short,
    Long,
    Point,
    Other(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Integer => "integer",
            Mode::Float => "float",
            Mode::Double => "double",
            Mode::Byte => "byte",
            Mode::Short => "short",
            Mode::Long => "long",
            Mode::Point => "point",
            Mode::Other(s) => s,
        }
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "integer" => Mode::Integer,
            "float" => Mode::Float,
            "double" => Mode::Double,
            "byte" => Mode::Byte,
            "short" => Mode::Short,
            "long" => Mode::Long,
            "point" => Mode::Point,
            _ => Mode::Other(s),
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// Vertex property cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    List,
    Set,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::List => "list",
            Cardinality::Set => "set",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyMap>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub items: Option<Vec<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop_cardinality: Option<Cardinality>,
}

impl FieldSchema {
    pub fn of_kind(kind: FieldKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn number(mode: Mode, sample: Option<Value>) -> Self {
        Self {
            kind: Some(FieldKind::Number),
            mode: Some(mode),
            sample,
            ..Default::default()
        }
    }

    pub fn list(items: Vec<FieldSchema>) -> Self {
        Self {
            kind: Some(FieldKind::List),
            items: Some(items),
            ..Default::default()
        }
    }

    pub fn nested(kind: FieldKind, properties: PropertyMap) -> Self {
        Self {
            kind: Some(kind),
            properties: Some(properties),
            ..Default::default()
        }
    }
}

/// `items` may arrive as a single schema object instead of a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<FieldSchema>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<FieldSchema>),
        One(Box<FieldSchema>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => Some(items),
        Some(OneOrMany::One(item)) => Some(vec![*item]),
        None => None,
    })
}

/// Ordered field-name → schema mapping with first-write-wins declarations.
///
/// A field can only be declared once. An entry created by
/// [`PropertyMap::mark_unique`] counts as present and is never typed later.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, FieldSchema)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Insert `schema` under `name` unless the field is already present.
    ///
    /// Returns `true` when the schema was stored.
    pub fn declare(&mut self, name: &str, schema: FieldSchema) -> bool {
        if self.contains_key(name) {
            return false;
        }
        self.entries.push((name.to_string(), schema));
        true
    }

    /// Flag `name` as unique, creating a `{unique: true}` entry if needed.
    pub fn mark_unique(&mut self, name: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.unique = Some(true),
            None => self.entries.push((
                name.to_string(),
                FieldSchema {
                    unique: Some(true),
                    ..Default::default()
                },
            )),
        }
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, schema) in &self.entries {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PropertyMap, A::Error> {
                let mut entries: Vec<(String, FieldSchema)> = Vec::new();
                while let Some((name, schema)) = access.next_entry::<String, FieldSchema>()? {
                    if let Some(slot) = entries.iter_mut().find(|(n, _)| *n == name) {
                        slot.1 = schema;
                    } else {
                        entries.push((name, schema));
                    }
                }
                Ok(PropertyMap { entries })
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}

/// JSON-Schema-like model synthesized for one label or relationship type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaModel {
    pub required: Vec<String>,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "EXISTS")]
    Exists,
    #[serde(rename = "NODE_KEY")]
    NodeKey,
}

/// One parsed constraint. `NODE_KEY` records serialize their key as
/// `compositeNodeKey`, the others as `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRecord {
    pub name: String,
    pub kind: ConstraintType,
    pub key: Vec<String>,
}

impl Serialize for ConstraintRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.kind)?;
        let key_name = match self.kind {
            ConstraintType::NodeKey => "compositeNodeKey",
            _ => "key",
        };
        map.serialize_entry(key_name, &self.key)?;
        map.end()
    }
}

/// Entity-level form of a `NODE_KEY` constraint (type stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKeyConstraint {
    pub name: String,
    pub composite_node_key: Vec<String>,
}

impl From<&ConstraintRecord> for NodeKeyConstraint {
    fn from(record: &ConstraintRecord) -> Self {
        Self {
            name: record.name.clone(),
            composite_node_key: record.key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub name: String,
    pub key: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub json_schema: SchemaModel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityLevel {
    pub constraint: Vec<NodeKeyConstraint>,
    pub index: Vec<IndexRecord>,
}

/// Reverse-engineered vertex label, ready for the host application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPackage {
    pub db_name: String,
    pub collection_name: String,
    pub documents: Vec<Document>,
    pub indexes: Vec<Value>,
    pub bucket_indexes: Vec<Value>,
    pub views: Vec<Value>,
    pub validation: Validation,
    pub empty_bucket: bool,
    pub bucket_info: Value,
    pub entity_level: EntityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_template: Option<Document>,
}

/// Reverse-engineered `(start)-[relationship]->(end)` edge type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipPackage {
    pub db_name: String,
    pub parent_collection: String,
    pub relationship_name: String,
    pub child_collection: String,
    pub documents: Vec<Document>,
    pub validation: Validation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_template: Option<Document>,
}
