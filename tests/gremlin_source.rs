//! Integration tests for the Gremlin traversal adapter, driven by a mock
//! client that records every submitted traversal.

use anyhow::{bail, Result};
use async_trait::async_trait;
use gremlin_harness::config::SourceConfig;
use gremlin_harness::gremlin::{GremlinClient, GremlinSource};
use gremlin_harness::sampling::{reverse_engineer, SamplingOptions};
use gremlin_harness::source::{GraphSource, Row, SchemaTriple};
use gremlin_harness_core::models::{FieldKind, Mode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ─── Mock client ────────────────────────────────────────────────────

#[derive(Default)]
struct MockClient {
    /// (query prefix, plain results, typed results)
    answers: Vec<(String, Vec<Value>, Vec<Value>)>,
    submitted: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MockClient {
    fn answer(mut self, prefix: &str, plain: Vec<Value>, typed: Vec<Value>) -> Self {
        self.answers.push((prefix.to_string(), plain, typed));
        self
    }

    fn lookup(&self, query: &str, typed: bool) -> Result<Vec<Value>> {
        self.submitted.lock().unwrap().push(query.to_string());
        match self.answers.iter().find(|(p, _, _)| query.starts_with(p.as_str())) {
            Some((_, plain, typed_rows)) => Ok(if typed {
                typed_rows.clone()
            } else {
                plain.clone()
            }),
            None => bail!("no answer for {}", query),
        }
    }

    fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl GremlinClient for MockClient {
    async fn submit(&self, query: &str) -> Result<Vec<Value>> {
        self.lookup(query, false)
    }

    async fn submit_typed(&self, query: &str) -> Result<Vec<Value>> {
        self.lookup(query, true)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn social() -> MockClient {
    MockClient::default()
        .answer(
            "g.V().label()",
            vec![json!("Person"), json!("City")],
            vec![],
        )
        .answer("g.V().hasLabel('Person').count()", vec![json!(200)], vec![])
        .answer(
            "g.V().hasLabel('Person').limit(",
            vec![json!({ "id": [1], "name": ["Ann"], "age": [30, 31] })],
            vec![json!({
                "@type": "g:Map",
                "@value": ["age", { "@type": "g:List", "@value": [{ "@type": "g:Int64", "@value": 30 }] }]
            })],
        )
        .answer(
            "g.V().hasLabel('Person').outE()",
            vec![
                json!({ "edge": "LIVES_IN", "end": "City" }),
                json!({ "edge": "KNOWS", "end": "Person" }),
            ],
            vec![],
        )
        .answer("g.V().hasLabel('City').count()", vec![json!(3)], vec![])
        .answer(
            "g.V().hasLabel('City').limit(",
            vec![json!({ "zip": [2139] })],
            vec![],
        )
        .answer("g.V().hasLabel('City').outE()", vec![], vec![])
        .answer("g.E().hasLabel('LIVES_IN')", vec![json!(1)], vec![])
}

// ─── Traversals ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_labels_and_counts() {
    let source = GremlinSource::new(social(), "social");
    assert_eq!(source.labels().await.unwrap(), vec!["Person", "City"]);
    assert_eq!(source.count("Person").await.unwrap(), 200);
    assert_eq!(source.database_name().await.unwrap(), "social");
}

#[tokio::test]
async fn test_plain_sample_is_flattened() {
    let source = GremlinSource::new(social(), "social");
    let rows = source.sample("Person", 2).await.unwrap();
    assert_eq!(
        rows,
        vec![Row::Plain(json!({ "id": 1, "name": "Ann", "age": 30 }))]
    );
}

#[tokio::test]
async fn test_typed_sample_uses_typed_submission() {
    let config = SourceConfig {
        dump: None,
        typed: true,
    };
    let source = GremlinSource::from_config(social(), "social", &config);
    let rows = source.sample("Person", 2).await.unwrap();
    assert!(matches!(rows[0], Row::Typed(_)));
}

#[tokio::test]
async fn test_first_triple_per_label() {
    let source = GremlinSource::new(social(), "social");
    let triples = source
        .schema_triples(&["Person".to_string(), "City".to_string()])
        .await
        .unwrap();
    assert_eq!(
        triples,
        vec![SchemaTriple {
            start: "Person".to_string(),
            relationship: "LIVES_IN".to_string(),
            end: "City".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_no_catalogue_and_close_reaches_client() {
    let source = GremlinSource::new(social(), "social");
    assert!(source.constraint_descriptions().await.unwrap().is_empty());
    assert!(source.index_descriptions().await.unwrap().is_empty());
    source.close().await.unwrap();
}

#[tokio::test]
async fn test_non_numeric_count_is_an_error() {
    let client = MockClient::default().answer("g.V().hasLabel('X').count()", vec![json!("many")], vec![]);
    let source = GremlinSource::new(client, "db");
    assert!(source.count("X").await.is_err());
}

// ─── End to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_reverse_engineer_over_gremlin() {
    let source = GremlinSource::new(social(), "social").with_typed(true);
    let options = SamplingOptions::default();

    let result = reverse_engineer(
        &source,
        &["Person".to_string(), "City".to_string()],
        &options,
    )
    .await
    .unwrap();

    // City has no typed answer, so its sample is empty and it is suppressed.
    assert_eq!(result.collections.len(), 1);
    let person = &result.collections[0];
    let age = person.validation.json_schema.properties.get("age").unwrap();
    assert_eq!(age.kind, Some(FieldKind::Number));
    assert_eq!(age.mode, Some(Mode::Long));
    assert!(result.relationships.is_empty());
}

#[tokio::test]
async fn test_submitted_traversals() {
    let source = GremlinSource::new(social(), "social");
    let options = SamplingOptions::default();

    let result = reverse_engineer(
        &source,
        &["Person".to_string(), "City".to_string()],
        &options,
    )
    .await
    .unwrap();
    source.close().await.unwrap();

    assert_eq!(result.collections.len(), 2);
    assert_eq!(result.relationships.len(), 1);
    assert!(source.client().closed.load(Ordering::SeqCst));

    let submitted = source.client().submitted();
    for expected in [
        "g.V().hasLabel('Person').count().next()",
        "g.V().hasLabel('Person').limit(2).valueMap(true).toList()",
        "g.V().hasLabel('City').limit(0).valueMap(true).toList()",
        "g.V().hasLabel('Person').outE().limit(100).as('edge').inV().as('end')\
         .select('edge', 'end').by(label).dedup().toList()",
        "g.E().hasLabel('LIVES_IN').where(and(outV().label().is(eq('Person')), \
         inV().label().is(eq('City')))).count().next()",
    ] {
        assert!(
            submitted.iter().any(|q| q == expected),
            "missing {} in {:?}",
            expected,
            submitted
        );
    }
}
