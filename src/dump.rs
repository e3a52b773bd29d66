//! Offline graph source backed by a JSON snapshot.
//!
//! A snapshot captures what a live session would answer: per-label counts
//! and rows, observed relationship triples with their edge rows, and the
//! constraint/index catalogue.
//!
//! ```json
//! {
//!   "dbName": "social",
//!   "labels": [
//!     { "name": "Person", "count": 2, "rows": [{ "age": 30 }, { "age": 41 }] }
//!   ],
//!   "relationships": [
//!     { "start": "Person", "relationship": "KNOWS", "end": "Person",
//!       "count": 1, "rows": [{ "since": 2001 }] }
//!   ],
//!   "constraints": ["CONSTRAINT ON (p:Person) ASSERT p.email IS UNIQUE"],
//!   "indexes": [{ "description": "INDEX ON :Person(name)", "state": "ONLINE" }]
//! }
//! ```
//!
//! Rows of an entry with `"typed": true` are GraphSON values and go through
//! the typed decoder.

use anyhow::{Context, Result};
use async_trait::async_trait;
use gremlin_harness_core::constraints::IndexDescription;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::source::{GraphSource, Row, SchemaTriple};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub db_name: String,
    #[serde(default = "empty_object")]
    pub bucket_info: Value,
    #[serde(default)]
    pub labels: Vec<LabelSnapshot>,
    #[serde(default)]
    pub relationships: Vec<RelationshipSnapshot>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelSnapshot {
    pub name: String,
    /// Total vertex count. Defaults to the number of rows.
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub typed: bool,
    #[serde(default)]
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipSnapshot {
    pub start: String,
    pub relationship: String,
    pub end: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub typed: bool,
    #[serde(default)]
    pub rows: Vec<Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn take_rows(rows: &[Value], typed: bool, limit: u64) -> Vec<Row> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    rows.iter()
        .take(limit)
        .cloned()
        .map(|row| if typed { Row::Typed(row) } else { Row::Plain(row) })
        .collect()
}

fn row_count(count: Option<u64>, rows: &[Value]) -> u64 {
    count.unwrap_or(rows.len() as u64)
}

/// Serves every [`GraphSource`] operation from an in-memory [`Snapshot`].
pub struct DumpSource {
    snapshot: Snapshot,
}

impl DumpSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
        Ok(Self::new(snapshot))
    }

    /// Open the snapshot named on the command line, falling back to
    /// `[source].dump`.
    pub fn open(config: &Config, dump: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match dump {
            Some(path) => path.to_path_buf(),
            None => config.source.dump.clone().context(
                "No graph source configured: pass --dump or set [source].dump",
            )?,
        };
        Self::load(&path)
    }

    fn label(&self, name: &str) -> Result<&LabelSnapshot> {
        self.snapshot
            .labels
            .iter()
            .find(|l| l.name == name)
            .with_context(|| format!("Unknown label: '{}'", name))
    }

    fn relationship(&self, triple: &SchemaTriple) -> Result<&RelationshipSnapshot> {
        self.snapshot
            .relationships
            .iter()
            .find(|r| {
                r.start == triple.start
                    && r.relationship == triple.relationship
                    && r.end == triple.end
            })
            .with_context(|| format!("Unknown relationship: {}", triple))
    }
}

#[async_trait]
impl GraphSource for DumpSource {
    async fn database_name(&self) -> Result<String> {
        Ok(self.snapshot.db_name.clone())
    }

    async fn labels(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.labels.iter().map(|l| l.name.clone()).collect())
    }

    async fn count(&self, label: &str) -> Result<u64> {
        let entry = self.label(label)?;
        Ok(row_count(entry.count, &entry.rows))
    }

    async fn sample(&self, label: &str, limit: u64) -> Result<Vec<Row>> {
        let entry = self.label(label)?;
        Ok(take_rows(&entry.rows, entry.typed, limit))
    }

    async fn schema_triples(&self, labels: &[String]) -> Result<Vec<SchemaTriple>> {
        Ok(self
            .snapshot
            .relationships
            .iter()
            .filter(|r| labels.contains(&r.start))
            .map(|r| SchemaTriple {
                start: r.start.clone(),
                relationship: r.relationship.clone(),
                end: r.end.clone(),
            })
            .collect())
    }

    async fn edge_count(&self, triple: &SchemaTriple) -> Result<u64> {
        let entry = self.relationship(triple)?;
        Ok(row_count(entry.count, &entry.rows))
    }

    async fn edge_sample(&self, triple: &SchemaTriple, limit: u64) -> Result<Vec<Row>> {
        let entry = self.relationship(triple)?;
        Ok(take_rows(&entry.rows, entry.typed, limit))
    }

    async fn constraint_descriptions(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.constraints.clone())
    }

    async fn index_descriptions(&self) -> Result<Vec<IndexDescription>> {
        Ok(self.snapshot.indexes.clone())
    }

    async fn bucket_info(&self) -> Result<Value> {
        Ok(self.snapshot.bucket_info.clone())
    }
}
