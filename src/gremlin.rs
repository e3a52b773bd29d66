//! Gremlin traversal adapter.
//!
//! [`GremlinSource`] implements [`GraphSource`] by submitting traversal
//! strings through a [`GremlinClient`]. The client is the transport seam:
//! it owns the connection, timeouts and serialization; this module only
//! decides which traversals to run and how to read their results back.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use gremlin_harness_core::constraints::IndexDescription;
use serde_json::{Map, Value};

use crate::config::SourceConfig;
use crate::source::{GraphSource, Row, SchemaTriple};

/// Edges inspected per label when discovering relationship triples.
const TRIPLE_PROBE_LIMIT: u64 = 100;

/// Transport for Gremlin traversals.
#[async_trait]
pub trait GremlinClient: Send + Sync {
    /// Submit a traversal and return its results as plain JSON.
    async fn submit(&self, query: &str) -> Result<Vec<Value>>;

    /// Submit a traversal and return its results as GraphSON.
    async fn submit_typed(&self, query: &str) -> Result<Vec<Value>>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn labels_query() -> String {
    "g.V().label().dedup().toList()".to_string()
}

pub fn count_query(label: &str) -> String {
    format!("g.V().hasLabel({}).count().next()", quote(label))
}

pub fn sample_query(label: &str, limit: u64) -> String {
    format!(
        "g.V().hasLabel({}).limit({}).valueMap(true).toList()",
        quote(label),
        limit
    )
}

pub fn triples_query(label: &str, limit: u64) -> String {
    format!(
        "g.V().hasLabel({}).outE().limit({}).as('edge').inV().as('end')\
         .select('edge', 'end').by(label).dedup().toList()",
        quote(label),
        limit
    )
}

fn edge_filter(triple: &SchemaTriple) -> String {
    format!(
        "g.E().hasLabel({}).where(and(outV().label().is(eq({})), inV().label().is(eq({}))))",
        quote(&triple.relationship),
        quote(&triple.start),
        quote(&triple.end)
    )
}

pub fn edge_count_query(triple: &SchemaTriple) -> String {
    format!("{}.count().next()", edge_filter(triple))
}

pub fn edge_sample_query(triple: &SchemaTriple, limit: u64) -> String {
    format!(
        "{}.limit({}).valueMap(true).toList()",
        edge_filter(triple),
        limit
    )
}

/// A [`GraphSource`] backed by a Gremlin server.
pub struct GremlinSource<C> {
    client: C,
    db_name: String,
    typed: bool,
}

impl<C: GremlinClient> GremlinSource<C> {
    pub fn new(client: C, db_name: impl Into<String>) -> Self {
        Self {
            client,
            db_name: db_name.into(),
            typed: false,
        }
    }

    pub fn from_config(client: C, db_name: impl Into<String>, config: &SourceConfig) -> Self {
        Self::new(client, db_name).with_typed(config.typed)
    }

    /// Sample through `submit_typed` and hand GraphSON rows to the decoder.
    pub fn with_typed(mut self, typed: bool) -> Self {
        self.typed = typed;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn scalar(&self, query: &str) -> Result<u64> {
        let results = self.client.submit(query).await?;
        let value = results
            .first()
            .ok_or_else(|| anyhow!("Empty result for query: {}", query))?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f.max(0.0) as u64))
            .ok_or_else(|| anyhow!("Expected a count, got {} for query: {}", value, query))
    }

    async fn rows(&self, query: &str) -> Result<Vec<Row>> {
        if self.typed {
            let rows = self.client.submit_typed(query).await?;
            Ok(rows.into_iter().map(Row::Typed).collect())
        } else {
            let rows = self.client.submit(query).await?;
            Ok(rows.into_iter().map(|r| Row::Plain(flatten(r))).collect())
        }
    }
}

/// Flatten a plain `valueMap(true)` row: list-valued properties contribute
/// their first element.
fn flatten(row: Value) -> Value {
    match row {
        Value::Object(fields) => {
            let flat: Map<String, Value> = fields
                .into_iter()
                .map(|(name, value)| {
                    let value = match value {
                        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
                        other => other,
                    };
                    (name, value)
                })
                .collect();
            Value::Object(flat)
        }
        other => other,
    }
}

fn text_field(value: &Value, name: &str) -> Option<String> {
    value.get(name)?.as_str().map(str::to_string)
}

#[async_trait]
impl<C: GremlinClient> GraphSource for GremlinSource<C> {
    async fn database_name(&self) -> Result<String> {
        Ok(self.db_name.clone())
    }

    async fn labels(&self) -> Result<Vec<String>> {
        let results = self.client.submit(&labels_query()).await?;
        Ok(results
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    async fn count(&self, label: &str) -> Result<u64> {
        self.scalar(&count_query(label)).await
    }

    async fn sample(&self, label: &str, limit: u64) -> Result<Vec<Row>> {
        self.rows(&sample_query(label, limit)).await
    }

    /// One triple per label: the first `(edge, end)` pair the traversal
    /// returns. Labels without outgoing edges contribute nothing.
    async fn schema_triples(&self, labels: &[String]) -> Result<Vec<SchemaTriple>> {
        let mut triples = Vec::new();
        for label in labels {
            let results = self
                .client
                .submit(&triples_query(label, TRIPLE_PROBE_LIMIT))
                .await?;
            let Some(first) = results.first() else {
                continue;
            };
            if let (Some(relationship), Some(end)) =
                (text_field(first, "edge"), text_field(first, "end"))
            {
                triples.push(SchemaTriple {
                    start: label.clone(),
                    relationship,
                    end,
                });
            }
        }
        Ok(triples)
    }

    async fn edge_count(&self, triple: &SchemaTriple) -> Result<u64> {
        self.scalar(&edge_count_query(triple)).await
    }

    async fn edge_sample(&self, triple: &SchemaTriple, limit: u64) -> Result<Vec<Row>> {
        self.rows(&edge_sample_query(triple, limit)).await
    }

    async fn constraint_descriptions(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn index_descriptions(&self) -> Result<Vec<IndexDescription>> {
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}
