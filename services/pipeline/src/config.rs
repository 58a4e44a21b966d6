//! Pipeline configuration read from the environment.

use std::path::{Path, PathBuf};

pub const DEFAULT_REMOTE_BASE: &str = "http://localhost:5047";
pub const DEFAULT_ORDERS_PATH: &str = "/api/Genel/getSIPARISLERCVS";
pub const DEFAULT_CSV_PATH: &str = "orders.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the pipeline reads from. Built from the environment by the binaries.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub remote_base: String,
    pub remote_orders_path: String,
    pub bearer_token: Option<String>,
    pub remote_timeout_secs: u64,
    pub csv_path: PathBuf,
    /// Base for a relative `csv_path`
    pub data_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            remote_orders_path: DEFAULT_ORDERS_PATH.to_string(),
            bearer_token: None,
            remote_timeout_secs: DEFAULT_TIMEOUT_SECS,
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            data_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            remote_base: var("REMOTE_API_BASE").unwrap_or(defaults.remote_base),
            remote_orders_path: var("REMOTE_ORDERS_PATH").unwrap_or(defaults.remote_orders_path),
            bearer_token: var("REMOTE_BEARER_TOKEN"),
            remote_timeout_secs: var("REMOTE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.remote_timeout_secs),
            csv_path: var("CSV_PATH").map(PathBuf::from).unwrap_or(defaults.csv_path),
            data_dir: var("DATA_DIR")
                .map(PathBuf::from)
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or(defaults.data_dir),
        }
    }

    pub fn remote_url(&self) -> String {
        format!("{}{}", self.remote_base.trim_end_matches('/'), self.remote_orders_path)
    }

    /// Absolute CSV snapshot path.
    pub fn resolve_csv_path(&self) -> PathBuf {
        resolve_against(&self.data_dir, &self.csv_path)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
