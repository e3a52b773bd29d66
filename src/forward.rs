//! `forward` command: turn a container model into a Gremlin script.

use anyhow::{Context, Result};
use gremlin_harness_core::script::{generate_container_script, ContainerData};
use std::path::Path;

pub fn run_forward(model: &Path, output: Option<&Path>) -> Result<()> {
    let content = std::fs::read_to_string(model)
        .with_context(|| format!("Failed to read model: {}", model.display()))?;
    let data: ContainerData = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse model: {}", model.display()))?;

    let script = generate_container_script(&data)?;
    log::info!(
        "Generated script for {} collection(s), {} relationship(s)",
        data.collections.len(),
        data.relationships.len()
    );

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &script)?;
            eprintln!("Wrote script to {}", path.display());
        }
        None => {
            println!("{}", script);
        }
    }

    Ok(())
}
