//! `reverse` command: sample a graph and emit collection and relationship
//! packages as JSON.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::dump::DumpSource;
use crate::sampling::{reverse_engineer, SamplingOptions};
use crate::source::GraphSource;

/// Run reverse engineering over `labels` (all labels when empty).
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_reverse(
    config: &Config,
    dump: Option<&Path>,
    labels: Vec<String>,
    output: Option<&Path>,
) -> Result<()> {
    let source = DumpSource::open(config, dump)?;
    let result = reverse_with(&source, config, labels).await;
    source.close().await?;
    let result = result?;

    let collection_count = result.collections.len();
    let relationship_count = result.relationships.len();
    let json = serde_json::to_string_pretty(&result)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} collections, {} relationships to {}",
                collection_count,
                relationship_count,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

async fn reverse_with<S: GraphSource + ?Sized>(
    source: &S,
    config: &Config,
    labels: Vec<String>,
) -> Result<crate::sampling::ReverseResult> {
    let labels = if labels.is_empty() {
        source.labels().await?
    } else {
        labels
    };
    reverse_engineer(source, &labels, &SamplingOptions::from_config(config)).await
}
