//! Server configuration from environment variables.
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const ADDR_VAR: &str = "PUDDLE_ADDR";
pub const DATA_DIR_VAR: &str = "PUDDLE_DATA_DIR";
pub const MAX_UPLOAD_VAR: &str = "PUDDLE_MAX_UPLOAD_BYTES";

const DEFAULT_ADDR: &str = "0.0.0.0:8787";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Listen address
    pub addr: String,
    /// Directory for the file-backed document store; memory store when unset
    pub data_dir: Option<PathBuf>,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            data_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let max_upload_bytes = match get(MAX_UPLOAD_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{} must be a byte count, got {:?}", MAX_UPLOAD_VAR, raw))?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            addr: get(ADDR_VAR).unwrap_or(defaults.addr),
            data_dir: get(DATA_DIR_VAR).map(PathBuf::from),
            max_upload_bytes,
        })
    }
}
