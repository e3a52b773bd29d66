//! Reverse-engineering orchestration.
//!
//! Drives a [`GraphSource`] through the full flow for a batch of labels:
//!
//! ```text
//! catalogue (constraints, indexes)
//!   → per label: count → sample → decode → synthesize → package
//!   → triples between surviving labels
//!   → per triple: count → sample → decode → synthesize → package
//! ```
//!
//! Labels and triples are sampled with bounded concurrency
//! (`concurrency.max_in_flight`). The first failure aborts the batch.
//! Collection packages come back in the requested label order regardless
//! of completion order.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use gremlin_harness_core::constraints::{parse_constraints, parse_indexes};
use gremlin_harness_core::document::{deserialize_documents, is_empty_sample, merge_template};
use gremlin_harness_core::graphson::decode_row;
use gremlin_harness_core::models::{
    CollectionPackage, ConstraintRecord, ConstraintType, Document, EntityLevel, IndexRecord,
    NodeKeyConstraint, PropertyMap, RelationshipPackage, Validation,
};
use gremlin_harness_core::synthesize::{synthesize_seeded, Synthesis};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::config::{Config, SamplingConfig};
use crate::source::{GraphSource, Row, SchemaTriple};

/// Options the orchestrator needs, lifted out of [`Config`].
#[derive(Debug, Clone)]
pub struct SamplingOptions {
    pub sampling: SamplingConfig,
    pub field_inference: bool,
    pub include_empty_collections: bool,
    pub max_in_flight: usize,
}

impl SamplingOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sampling: config.sampling.clone(),
            field_inference: config.inference.field_inference,
            include_empty_collections: config.inference.include_empty_collections,
            max_in_flight: config.concurrency.max_in_flight.max(1),
        }
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything produced by one reverse-engineering run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReverseResult {
    pub collections: Vec<CollectionPackage>,
    pub relationships: Vec<RelationshipPackage>,
}

/// Catalogue and container data shared by every entity in a batch.
struct BatchContext {
    db_name: String,
    bucket_info: Value,
    constraints: BTreeMap<String, Vec<ConstraintRecord>>,
    indexes: BTreeMap<String, Vec<IndexRecord>>,
}

impl BatchContext {
    fn constraints_for(&self, name: &str) -> &[ConstraintRecord] {
        self.constraints.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Decoded sample of one entity, ready for packaging.
struct EntitySample {
    synthesis: Synthesis,
    template: Option<Document>,
    empty: bool,
}

/// Reverse-engineer `labels` and the relationships between them.
///
/// Labels whose sample holds no fields are left out unless
/// `include_empty_collections` is set; relationships are only sampled when
/// both endpoints survived.
pub async fn reverse_engineer<S>(
    source: &S,
    labels: &[String],
    options: &SamplingOptions,
) -> Result<ReverseResult>
where
    S: GraphSource + ?Sized,
{
    let context = load_context(source).await?;
    let limit = options.max_in_flight.max(1);

    info!(
        "Reverse engineering {} label(s) from '{}'",
        labels.len(),
        context.db_name
    );

    let mut sampled: Vec<(usize, Option<CollectionPackage>)> =
        stream::iter(labels.iter().enumerate())
            .map(|(index, label)| {
                let context = &context;
                async move {
                    let package = sample_label(source, context, label, options)
                        .await
                        .with_context(|| format!("Failed to sample label '{}'", label))?;
                    Ok::<_, anyhow::Error>((index, package))
                }
            })
            .buffer_unordered(limit)
            .try_collect()
            .await?;
    sampled.sort_by_key(|(index, _)| *index);

    let collections: Vec<CollectionPackage> =
        sampled.into_iter().filter_map(|(_, p)| p).collect();
    let surviving: Vec<String> = collections
        .iter()
        .map(|c| c.collection_name.clone())
        .collect();

    let triples = surviving_triples(source, &surviving).await?;

    let mut sampled: Vec<(usize, RelationshipPackage)> = stream::iter(triples.iter().enumerate())
        .map(|(index, triple)| {
            let context = &context;
            async move {
                let package = sample_relationship(source, context, triple, options)
                    .await
                    .with_context(|| format!("Failed to sample relationship {}", triple))?;
                Ok::<_, anyhow::Error>((index, package))
            }
        })
        .buffer_unordered(limit)
        .try_collect()
        .await?;
    sampled.sort_by_key(|(index, _)| *index);

    let relationships = sampled.into_iter().map(|(_, p)| p).collect::<Vec<_>>();

    info!(
        "Reverse engineered {} collection(s) and {} relationship(s)",
        collections.len(),
        relationships.len()
    );

    Ok(ReverseResult {
        collections,
        relationships,
    })
}

async fn load_context<S: GraphSource + ?Sized>(source: &S) -> Result<BatchContext> {
    let db_name = source
        .database_name()
        .await
        .context("Failed to read database name")?;
    let bucket_info = source
        .bucket_info()
        .await
        .context("Failed to read bucket info")?;
    let constraint_text = source
        .constraint_descriptions()
        .await
        .context("Failed to list constraints")?;
    let index_descriptions = source
        .index_descriptions()
        .await
        .context("Failed to list indexes")?;

    let constraints = parse_constraints(&constraint_text);
    let indexes = parse_indexes(&index_descriptions);
    debug!(
        "Catalogue: {} constrained label(s), {} indexed label(s)",
        constraints.len(),
        indexes.len()
    );

    Ok(BatchContext {
        db_name,
        bucket_info,
        constraints,
        indexes,
    })
}

/// Triples whose endpoints both survived label sampling, first occurrence
/// kept.
async fn surviving_triples<S: GraphSource + ?Sized>(
    source: &S,
    surviving: &[String],
) -> Result<Vec<SchemaTriple>> {
    if surviving.is_empty() {
        return Ok(Vec::new());
    }
    let triples = source
        .schema_triples(surviving)
        .await
        .context("Failed to list relationship types")?;

    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for triple in triples {
        if !surviving.contains(&triple.start) || !surviving.contains(&triple.end) {
            debug!("Skipping {}: endpoint not sampled", triple);
            continue;
        }
        if seen.insert(triple.clone()) {
            kept.push(triple);
        }
    }
    Ok(kept)
}

async fn sample_label<S: GraphSource + ?Sized>(
    source: &S,
    context: &BatchContext,
    label: &str,
    options: &SamplingOptions,
) -> Result<Option<CollectionPackage>> {
    let count = source.count(label).await?;
    let size = options.sampling.sample_size(count);
    let rows = source.sample(label, size).await?;
    info!(
        "Label '{}': sampling {} of {} vertices ({} returned)",
        label,
        size,
        count,
        rows.len()
    );

    let constraints = context.constraints_for(label);
    let entity = build_entity(rows, constraints, options);

    if entity.empty && !options.include_empty_collections {
        debug!("Label '{}': empty sample, package suppressed", label);
        return Ok(None);
    }

    let entity_level = EntityLevel {
        constraint: constraints
            .iter()
            .filter(|c| c.kind == ConstraintType::NodeKey)
            .map(NodeKeyConstraint::from)
            .collect(),
        index: context.indexes.get(label).cloned().unwrap_or_default(),
    };

    Ok(Some(CollectionPackage {
        db_name: context.db_name.clone(),
        collection_name: label.to_string(),
        documents: entity.synthesis.documents,
        indexes: Vec::new(),
        bucket_indexes: Vec::new(),
        views: Vec::new(),
        validation: Validation {
            json_schema: entity.synthesis.schema,
        },
        empty_bucket: false,
        bucket_info: context.bucket_info.clone(),
        entity_level,
        document_template: entity.template,
    }))
}

async fn sample_relationship<S: GraphSource + ?Sized>(
    source: &S,
    context: &BatchContext,
    triple: &SchemaTriple,
    options: &SamplingOptions,
) -> Result<RelationshipPackage> {
    let count = source.edge_count(triple).await?;
    let size = options.sampling.sample_size(count);
    let rows = source.edge_sample(triple, size).await?;
    info!(
        "Relationship {}: sampling {} of {} edges ({} returned)",
        triple,
        size,
        count,
        rows.len()
    );

    let entity = build_entity(rows, context.constraints_for(&triple.relationship), options);

    Ok(RelationshipPackage {
        db_name: context.db_name.clone(),
        parent_collection: triple.start.clone(),
        relationship_name: triple.relationship.clone(),
        child_collection: triple.end.clone(),
        documents: entity.synthesis.documents,
        validation: Validation {
            json_schema: entity.synthesis.schema,
        },
        document_template: entity.template,
    })
}

fn build_entity(
    rows: Vec<Row>,
    constraints: &[ConstraintRecord],
    options: &SamplingOptions,
) -> EntitySample {
    let (documents, seed) = decode_rows(rows);
    let synthesis = synthesize_seeded(documents, constraints, &seed);
    let empty = is_empty_sample(&synthesis.documents);

    let template = options.field_inference.then(|| {
        let known: Document = seed
            .iter()
            .map(|(name, schema)| {
                (
                    name.to_string(),
                    schema.sample.clone().unwrap_or(Value::Null),
                )
            })
            .collect();
        merge_template(known, &synthesis.documents)
    });

    EntitySample {
        synthesis,
        template,
        empty,
    }
}

/// Turn sampled rows into normalized documents, collecting the shapes
/// known from typed rows.
fn decode_rows(rows: Vec<Row>) -> (Vec<Document>, PropertyMap) {
    let mut seed = PropertyMap::new();
    let mut plain = Vec::with_capacity(rows.len());

    for row in rows {
        match row {
            Row::Plain(value) => plain.push(value),
            Row::Typed(value) => {
                let decoded = decode_row(&value);
                for (name, schema) in decoded.properties.iter() {
                    seed.declare(name, schema.clone());
                }
                plain.push(Value::Object(decoded.document));
            }
        }
    }

    (deserialize_documents(plain), seed)
}
