// src/config/app.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extract::fetch::{DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};
use crate::extract::patterns::PatternTable;

// --- env names & defaults ---
pub const ENV_PATTERNS_PATH: &str = "MOTO_PATTERNS_PATH";
pub const ENV_MODEL_PATH: &str = "MOTO_MODEL_PATH";
pub const ENV_DATASET_PATH: &str = "MOTO_DATASET_PATH";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "MOTO_FETCH_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "MOTO_USER_AGENT";

pub const DEFAULT_MODEL_PATH: &str = "config/model.json";
pub const DEFAULT_DATASET_PATH: &str = "data/motorcycles_dataset.csv";

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` → embedded pattern table.
    pub patterns_path: Option<PathBuf>,
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
    /// Always set; a fetch without a timeout is never issued.
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            patterns_path: None,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// parse optional seconds env and clamp to <1..=60>; garbage → None
fn parse_timeout_env(raw: Option<String>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .map(|v| Duration::from_secs(v.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Resolve from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            patterns_path: non_empty_env(ENV_PATTERNS_PATH).map(PathBuf::from),
            model_path: non_empty_env(ENV_MODEL_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.model_path),
            dataset_path: non_empty_env(ENV_DATASET_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.dataset_path),
            fetch_timeout: parse_timeout_env(std::env::var(ENV_FETCH_TIMEOUT_SECS).ok())
                .unwrap_or(d.fetch_timeout),
            user_agent: non_empty_env(ENV_USER_AGENT).unwrap_or(d.user_agent),
        }
    }

    pub fn load_pattern_table(&self) -> anyhow::Result<PatternTable> {
        match &self.patterns_path {
            Some(p) => PatternTable::from_path(p),
            None => PatternTable::embedded(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}
