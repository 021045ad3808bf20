//! TOML configuration for the Strata CLI.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Storage location.
    pub store: StoreSection,
    /// Chunking and verification tuning.
    pub chunking: ChunkingSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[store]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Directory for the persistent record database.
    pub data_dir: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".strata"))
            .unwrap_or_else(|| PathBuf::from(".strata"));
        Self { data_dir }
    }
}

/// `[chunking]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChunkingSection {
    /// Tier-0 chunk size in bytes.
    pub base_chunk_bytes: Option<u64>,
    /// Verify chunk hashes and proofs during reconstruction.
    pub strict: bool,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            base_chunk_bytes: None,
            strict: true,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from an explicit path, or defaults when none is
    /// given. A missing explicit file is an error; an unreadable default
    /// is not.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }
}
