//! Constraint and index description parsing.
//!
//! Constraint descriptions follow the fixed upstream query-language syntax
//! (matched case-insensitively):
//!
//! ```text
//! CONSTRAINT ON (<var>:<Label>) ASSERT <var>.<field> IS UNIQUE
//! CONSTRAINT ON (<var>:<Label>) ASSERT exists(<var>.<field>)
//! CONSTRAINT ON (<var>:<Label>) ASSERT (<var>.<f1>, <var>.<f2>, ...) IS NODE KEY
//! CONSTRAINT ON (<var>:<Label>) ASSERT <var>.<field> IS NODE KEY
//! ```
//!
//! Index descriptions look like `INDEX ON :<Label>(<f1>, <f2>, ...)`.
//! Anything else is dropped without error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::{ConstraintRecord, ConstraintType, IndexRecord};

/// Result of matching one constraint description against the three grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintMatch {
    Unique { label: String, field: String },
    Exists { label: String, field: String },
    NodeKey { label: String, fields: Vec<String> },
    Unrecognized,
}

struct Grammars {
    unique: Regex,
    exists: Regex,
    node_key: Regex,
    qualified_field: Regex,
    index: Regex,
}

fn grammars() -> &'static Grammars {
    static GRAMMARS: OnceLock<Grammars> = OnceLock::new();
    GRAMMARS.get_or_init(|| Grammars {
        unique: Regex::new(
            r"(?i)^constraint\s+on\s+\([\s\S]+:([\s\S]+)\s*\)\s+assert\s+[\s\S]+\.([\s\S]+)\s+IS\s+UNIQUE",
        )
        .expect("unique constraint pattern"),
        exists: Regex::new(
            r"(?i)^constraint\s+on\s+\([\s\S]+:([\s\S]+)\s*\)\s+assert\s+exists\([\s\S]+\.([\s\S]+)\s*\)",
        )
        .expect("exists constraint pattern"),
        node_key: Regex::new(
            r"(?i)^constraint\s+on\s+\([\s\S]+:\s*([\s\S]+)\s*\)\s+assert\s+(?:\(\s*([\s\S]+)\s*\)|[\s\S]+\.\s*([\s\S]+)\s*)\s+IS\s+NODE\s+KEY",
        )
        .expect("node key constraint pattern"),
        qualified_field: Regex::new(r"[\s\S]+\.([\s\S]+)").expect("qualified field pattern"),
        index: Regex::new(r"(?i)INDEX\s+ON\s+:(.*)\((.*)\)").expect("index pattern"),
    })
}

/// Label or relationship type named by a pattern capture. Relationship
/// patterns (`()-[r:TYPE]-()`) leave their closing bracket in the capture.
fn entity_name(raw: &str) -> String {
    raw.split(']').next().unwrap_or(raw).trim().to_string()
}

/// Classify a single constraint description.
pub fn classify(description: &str) -> ConstraintMatch {
    let g = grammars();
    let text = description.trim();

    if let Some(caps) = g.unique.captures(text) {
        return ConstraintMatch::Unique {
            label: entity_name(&caps[1]),
            field: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = g.exists.captures(text) {
        return ConstraintMatch::Exists {
            label: entity_name(&caps[1]),
            field: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = g.node_key.captures(text) {
        let fields: Vec<String> = if let Some(list) = caps.get(2) {
            list.as_str()
                .split(',')
                .map(|part| match g.qualified_field.captures(part.trim()) {
                    Some(f) => f[1].trim().to_string(),
                    None => part.to_string(),
                })
                .collect()
        } else if let Some(single) = caps.get(3) {
            vec![single.as_str().trim().to_string()]
        } else {
            Vec::new()
        };

        if !fields.is_empty() {
            return ConstraintMatch::NodeKey {
                label: entity_name(&caps[1]),
                fields,
            };
        }
    }

    ConstraintMatch::Unrecognized
}

impl ConstraintMatch {
    /// The label this constraint belongs to and its structured record.
    pub fn into_record(self) -> Option<(String, ConstraintRecord)> {
        match self {
            ConstraintMatch::Unique { label, field } => {
                let record = ConstraintRecord {
                    name: format!("Unique {}.{}", label, field),
                    kind: ConstraintType::Unique,
                    key: vec![field],
                };
                Some((label, record))
            }
            ConstraintMatch::Exists { label, field } => {
                let record = ConstraintRecord {
                    name: format!("Required {}.{}", label, field),
                    kind: ConstraintType::Exists,
                    key: vec![field],
                };
                Some((label, record))
            }
            ConstraintMatch::NodeKey { label, fields } => {
                let record = ConstraintRecord {
                    name: label.clone(),
                    kind: ConstraintType::NodeKey,
                    key: fields,
                };
                Some((label, record))
            }
            ConstraintMatch::Unrecognized => None,
        }
    }
}

/// Parse constraint descriptions into records grouped by label.
pub fn parse_constraints<S: AsRef<str>>(
    descriptions: &[S],
) -> BTreeMap<String, Vec<ConstraintRecord>> {
    let mut grouped: BTreeMap<String, Vec<ConstraintRecord>> = BTreeMap::new();
    for description in descriptions {
        if let Some((label, record)) = classify(description.as_ref()).into_record() {
            grouped.entry(label).or_default().push(record);
        }
    }
    grouped
}

/// An index as reported by the database catalogue.
///
/// When `properties` is present it is used verbatim; otherwise the label and
/// fields are recovered from `description`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescription {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Option<Vec<String>>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider: Option<Value>,
}

/// Parse index descriptions into records grouped by label.
///
/// Descriptions with no recoverable label are dropped.
pub fn parse_indexes(descriptions: &[IndexDescription]) -> BTreeMap<String, Vec<IndexRecord>> {
    let g = grammars();
    let mut grouped: BTreeMap<String, Vec<IndexRecord>> = BTreeMap::new();

    for index in descriptions {
        let mut label = index.label.clone();
        let properties = if let Some(props) = &index.properties {
            props.clone()
        } else if let Some(caps) = index
            .description
            .as_deref()
            .and_then(|d| g.index.captures(d))
        {
            label = Some(caps[1].to_string());
            caps[2].split(',').map(|s| s.trim().to_string()).collect()
        } else {
            Vec::new()
        };

        let Some(label) = label else { continue };
        let record = IndexRecord {
            name: format!("{}.[{}]", label, properties.join(",")),
            key: properties,
            state: index.state.clone(),
            kind: index.kind.clone(),
            provider: index.provider.as_ref().and_then(provider_text),
        };
        grouped.entry(label).or_default().push(record);
    }

    grouped
}

/// Provider metadata is kept as JSON text with a four-space indent.
fn provider_text(provider: &Value) -> Option<String> {
    let mut out = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    provider.serialize(&mut ser).ok()?;
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unique_constraint() {
        let parsed = parse_constraints(&["CONSTRAINT ON (p:Person) ASSERT p.email IS UNIQUE"]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed["Person"],
            vec![ConstraintRecord {
                name: "Unique Person.email".to_string(),
                kind: ConstraintType::Unique,
                key: vec!["email".to_string()],
            }]
        );
    }

    #[test]
    fn test_exists_constraint_is_case_insensitive() {
        let m = classify("constraint on ( book:Book ) assert exists(book.isbn)");
        assert_eq!(
            m,
            ConstraintMatch::Exists {
                label: "Book".to_string(),
                field: "isbn".to_string()
            }
        );
        let (_, record) = m.into_record().unwrap();
        assert_eq!(record.name, "Required Book.isbn");
    }

    #[test]
    fn test_composite_node_key() {
        let m = classify("CONSTRAINT ON (n:Person) ASSERT (n.firstname, n.surname) IS NODE KEY");
        assert_eq!(
            m,
            ConstraintMatch::NodeKey {
                label: "Person".to_string(),
                fields: vec!["firstname".to_string(), "surname".to_string()],
            }
        );
    }

    #[test]
    fn test_single_field_node_key() {
        let parsed = parse_constraints(&["CONSTRAINT ON (n:Account) ASSERT n.number IS NODE KEY"]);
        let record = &parsed["Account"][0];
        assert_eq!(record.name, "Account");
        assert_eq!(record.kind, ConstraintType::NodeKey);
        assert_eq!(record.key, vec!["number".to_string()]);
    }

    #[test]
    fn test_unrecognized_is_dropped() {
        let parsed = parse_constraints(&[
            "INDEX ON :Person(name)",
            "CONSTRAINT ON (p:Person) ASSERT p.email IS INDEXED",
            "",
        ]);
        assert!(parsed.is_empty());
        assert_eq!(classify("totally unrelated"), ConstraintMatch::Unrecognized);
    }

    #[test]
    fn test_relationship_pattern_names_type() {
        let parsed = parse_constraints(&["CONSTRAINT ON ()-[k:KNOWS]-() ASSERT exists(k.since)"]);
        assert_eq!(parsed["KNOWS"][0].key, vec!["since".to_string()]);
        assert_eq!(parsed["KNOWS"][0].name, "Required KNOWS.since");
    }

    #[test]
    fn test_constraints_group_by_label() {
        let parsed = parse_constraints(&[
            "CONSTRAINT ON (p:Person) ASSERT p.email IS UNIQUE",
            "CONSTRAINT ON (p:Person) ASSERT exists(p.name)",
            "CONSTRAINT ON (c:City) ASSERT c.code IS UNIQUE",
        ]);
        assert_eq!(parsed["Person"].len(), 2);
        assert_eq!(parsed["City"].len(), 1);
    }

    #[test]
    fn test_index_from_description() {
        let parsed = parse_indexes(&[IndexDescription {
            description: Some("INDEX ON :Person(name, age)".to_string()),
            state: Some("ONLINE".to_string()),
            kind: Some("node_label_property".to_string()),
            provider: Some(json!({ "key": "native-btree", "version": "1.0" })),
            ..Default::default()
        }]);
        let record = &parsed["Person"][0];
        assert_eq!(record.name, "Person.[name,age]");
        assert_eq!(record.key, vec!["name".to_string(), "age".to_string()]);
        assert_eq!(record.state.as_deref(), Some("ONLINE"));
        assert_eq!(
            record.provider.as_deref(),
            Some("{\n    \"key\": \"native-btree\",\n    \"version\": \"1.0\"\n}")
        );
    }

    #[test]
    fn test_index_structured_properties_win() {
        let parsed = parse_indexes(&[IndexDescription {
            label: Some("City".to_string()),
            description: Some("INDEX ON :Ignored(other)".to_string()),
            properties: Some(vec!["code".to_string()]),
            ..Default::default()
        }]);
        assert_eq!(parsed["City"][0].name, "City.[code]");
        assert!(!parsed.contains_key("Ignored"));
    }

    #[test]
    fn test_index_without_label_is_dropped() {
        let parsed = parse_indexes(&[IndexDescription {
            description: Some("garbage".to_string()),
            ..Default::default()
        }]);
        assert!(parsed.is_empty());
    }
}
