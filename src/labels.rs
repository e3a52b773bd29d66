use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::dump::DumpSource;
use crate::source::GraphSource;

pub async fn list_labels(config: &Config, dump: Option<&Path>) -> Result<()> {
    let source = DumpSource::open(config, dump)?;
    source.test_connection().await?;

    let db_name = source.database_name().await?;
    let labels = source.labels().await?;
    source.close().await?;

    println!("DATABASE  {}", db_name);
    println!("LABELS    {}", labels.len());
    for label in &labels {
        println!("  {}", label);
    }

    Ok(())
}
