use std::collections::HashSet;
use std::path::PathBuf;

use serde::Deserialize;

/// Application-level constants
pub const APP_NAME: &str = "Chartfinder";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Character used to pack multiple file paths into the single stored
/// `paths` column. Reserved: must not appear inside a path.
pub const DEFAULT_PATH_DELIMITER: &str = ";";

/// Run configuration, passed explicitly into every pipeline stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directories scanned for patient documents, in scan order.
    pub root_dirs: Vec<PathBuf>,
    /// Demographic CSV export to ingest.
    pub csv_path: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Lowercase extensions (no dot) a file must carry to be indexed.
    pub allowed_extensions: HashSet<String>,
    /// Delimiter joining multiple paths in the stored path string.
    pub path_delimiter: String,
    /// Rows buffered per insert transaction during CSV ingestion.
    pub batch_size: usize,
    /// Destructively drop and recreate the store before this run.
    /// Off by default: schema reset is deliberate data loss.
    pub reset_store: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            root_dirs: vec![PathBuf::from("PatientData")],
            csv_path: PathBuf::from("data/patients.csv"),
            db_path: default_db_path(),
            allowed_extensions: ["pdf", "xml"].iter().map(|s| s.to_string()).collect(),
            path_delimiter: DEFAULT_PATH_DELIMITER.to_string(),
            batch_size: 500,
            reset_store: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file. Missing keys fall back to
    /// defaults via `#[serde(default)]`.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(&ext.to_ascii_lowercase())
    }
}

/// Default database location: ~/Chartfinder/patients.db
/// (user-visible, like the rest of the app's data).
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("patients.db")
}

/// Get the application data directory
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Chartfinder")
}

pub fn default_log_filter() -> &'static str {
    "info,chartfinder=debug"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
