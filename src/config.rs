//! Configuration module

use std::env;
use std::path::PathBuf;

/// Rows per evaluation chunk unless overridden
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Path to the model manifest (JSON)
    pub manifest_path: PathBuf,

    /// Static UI directory served at `/`
    pub frontend_dir: PathBuf,

    /// Rows read per evaluation chunk
    pub eval_chunk_size: usize,

    /// Retain scores and search for the F1-optimal threshold
    pub threshold_search: bool,

    /// Optional upload cap for the evaluation endpoint, in megabytes.
    /// Unset (or 0) streams uploads of any size.
    pub max_upload_mb: Option<usize>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            manifest_path: env::var("MANIFEST_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("artifacts/manifest.json")),

            frontend_dir: env::var("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("frontend")),

            eval_chunk_size: env::var("EVAL_CHUNK_SIZE")
                .ok()
                .and_then(|c| c.parse().ok())
                .filter(|&c: &usize| c > 0)
                .unwrap_or(DEFAULT_CHUNK_SIZE),

            threshold_search: env::var("THRESHOLD_SEARCH")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|m| m.parse().ok())
                .filter(|&m: &usize| m > 0),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn max_upload_bytes(&self) -> Option<usize> {
        self.max_upload_mb.map(|mb| mb.saturating_mul(1024 * 1024))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            manifest_path: PathBuf::from("artifacts/manifest.json"),
            frontend_dir: PathBuf::from("frontend"),
            eval_chunk_size: DEFAULT_CHUNK_SIZE,
            threshold_search: true,
            max_upload_mb: None,
            environment: "development".to_string(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
