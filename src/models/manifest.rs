//! Manifest model

use serde::{Deserialize, Serialize};

/// Registry manifest, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub default_model: String,
    pub target_column: String,
    pub feature_columns: Vec<String>,
    pub pipeline: PipelineEntry,
    pub models: Vec<ModelEntry>,
}

/// Preprocessing artifact: the category -> risk mapping table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEntry {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub technique: Option<String>,
    pub path: String,
    #[serde(default)]
    pub hyperparams_path: Option<String>,
    /// Hex SHA-256 of the artifact, verified when present
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ModelEntry {
    /// Human-readable technique, falling back to the id
    pub fn technique_label(&self) -> String {
        self.technique.clone().unwrap_or_else(|| self.id.clone())
    }
}
