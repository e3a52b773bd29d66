use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    Absolute,
    #[default]
    Relative,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    #[serde(default)]
    pub mode: SamplingMode,
    #[serde(default = "default_absolute")]
    pub absolute: u64,
    #[serde(default = "default_relative")]
    pub relative: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Relative,
            absolute: default_absolute(),
            relative: default_relative(),
        }
    }
}

fn default_absolute() -> u64 {
    1000
}
fn default_relative() -> f64 {
    1.0
}

impl SamplingConfig {
    /// Number of rows to fetch for an entity with `count` rows in total.
    pub fn sample_size(&self, count: u64) -> u64 {
        match self.mode {
            SamplingMode::Absolute => self.absolute,
            SamplingMode::Relative => (count as f64 * self.relative / 100.0).round() as u64,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InferenceConfig {
    #[serde(default)]
    pub field_inference: bool,
    #[serde(default)]
    pub include_empty_collections: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    /// JSON snapshot served by the offline source.
    #[serde(default)]
    pub dump: Option<PathBuf>,
    /// Sample through the typed (GraphSON) protocol path.
    #[serde(default)]
    pub typed: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if !(0.0..=100.0).contains(&config.sampling.relative) {
        anyhow::bail!("sampling.relative must be in [0, 100]");
    }

    if config.concurrency.max_in_flight == 0 {
        anyhow::bail!("concurrency.max_in_flight must be >= 1");
    }

    if config.log.level.trim().is_empty() {
        anyhow::bail!("log.level must not be empty");
    }

    Ok(())
}
