//! Graph source abstraction.
//!
//! The sampling pipeline never talks to a database directly. It consumes a
//! [`GraphSource`], which answers the handful of questions reverse
//! engineering needs: how many vertices/edges exist, a sample of them, the
//! observed `(start)-[relationship]->(end)` triples, and the constraint and
//! index catalogue.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               GraphSource                │
//! │  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ GremlinSource│  │   DumpSource     │  │
//! │  │ (client I/O) │  │ (JSON snapshot)  │  │
//! │  └──────────────┘  └──────────────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!        reverse_engineer() → packages
//! ```
//!
//! # Lifecycle
//!
//! The caller creates the source, passes it by reference into
//! [`reverse_engineer`](crate::sampling::reverse_engineer), and calls
//! [`close`](GraphSource::close) when done. Sources hold at most one live
//! connection; nothing is cached in process-wide state.

use anyhow::Result;
use async_trait::async_trait;
use gremlin_harness_core::constraints::IndexDescription;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One sampled vertex or edge as returned by the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// A plain JSON object, property name → value.
    Plain(Value),
    /// A GraphSON `g:Map` carrying explicit type tags.
    Typed(Value),
}

/// A relationship type observed between two labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaTriple {
    pub start: String,
    pub relationship: String,
    pub end: String,
}

impl std::fmt::Display for SchemaTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})-[{}]->({})", self.start, self.relationship, self.end)
    }
}

/// A property graph that can be sampled for schema inference.
///
/// Every method is a blocking round-trip from the pipeline's point of view:
/// timeouts and retries, if any, belong to the implementation.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use gremlin_harness::source::{GraphSource, Row, SchemaTriple};
/// use gremlin_harness_core::constraints::IndexDescription;
///
/// struct EmptyGraph;
///
/// #[async_trait]
/// impl GraphSource for EmptyGraph {
///     async fn database_name(&self) -> Result<String> { Ok("empty".into()) }
///     async fn labels(&self) -> Result<Vec<String>> { Ok(vec![]) }
///     async fn count(&self, _label: &str) -> Result<u64> { Ok(0) }
///     async fn sample(&self, _label: &str, _limit: u64) -> Result<Vec<Row>> { Ok(vec![]) }
///     async fn schema_triples(&self, _labels: &[String]) -> Result<Vec<SchemaTriple>> { Ok(vec![]) }
///     async fn edge_count(&self, _triple: &SchemaTriple) -> Result<u64> { Ok(0) }
///     async fn edge_sample(&self, _triple: &SchemaTriple, _limit: u64) -> Result<Vec<Row>> { Ok(vec![]) }
///     async fn constraint_descriptions(&self) -> Result<Vec<String>> { Ok(vec![]) }
///     async fn index_descriptions(&self) -> Result<Vec<IndexDescription>> { Ok(vec![]) }
/// }
/// ```
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Name reported as `dbName` in every package.
    async fn database_name(&self) -> Result<String>;

    /// Distinct vertex labels.
    async fn labels(&self) -> Result<Vec<String>>;

    /// Total number of vertices carrying `label`.
    async fn count(&self, label: &str) -> Result<u64>;

    /// Up to `limit` vertices carrying `label`.
    async fn sample(&self, label: &str, limit: u64) -> Result<Vec<Row>>;

    /// Relationship triples whose start label is one of `labels`.
    async fn schema_triples(&self, labels: &[String]) -> Result<Vec<SchemaTriple>>;

    /// Total number of edges matching `triple`.
    async fn edge_count(&self, triple: &SchemaTriple) -> Result<u64>;

    /// Up to `limit` edges matching `triple`.
    async fn edge_sample(&self, triple: &SchemaTriple, limit: u64) -> Result<Vec<Row>>;

    /// Raw constraint descriptions, e.g.
    /// `CONSTRAINT ON (p:Person) ASSERT p.email IS UNIQUE`.
    async fn constraint_descriptions(&self) -> Result<Vec<String>>;

    /// Index catalogue entries.
    async fn index_descriptions(&self) -> Result<Vec<IndexDescription>>;

    /// Container-level metadata copied into each collection package.
    async fn bucket_info(&self) -> Result<Value> {
        Ok(Value::Object(Map::new()))
    }

    /// Cheap round-trip used to verify connectivity.
    async fn test_connection(&self) -> Result<()> {
        self.labels().await.map(|_| ())
    }

    /// Release the underlying connection.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
