//! Model Registry
//!
//! Loads the manifest, the mapping table and every classifier once at
//! startup. Any failure here is fatal: the server never runs with a
//! partially loaded registry.

pub mod classifier;
pub mod estimators;

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::features::{FeatureEncoder, MappingTable};
use crate::models::{Manifest, ModelEntry};
use crate::{AppError, AppResult};

pub use classifier::Classifier;
pub use estimators::ModelArtifact;

/// A loaded model and its catalog metadata
#[derive(Debug)]
pub struct ModelInfo {
    pub id: String,
    pub technique: String,
    pub hyperparams: Value,
    pub classifier: Classifier,
}

#[derive(Debug)]
pub struct Registry {
    manifest: Manifest,
    encoder: FeatureEncoder,
    /// Manifest order
    models: Vec<ModelInfo>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Load everything the manifest references
    pub fn load(manifest_path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(manifest_path).map_err(|e| {
            AppError::ManifestError(format!("Manifest not found: {} ({})", manifest_path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let pipeline_path = resolve(base, &manifest.pipeline.path);
        let table = MappingTable::load(&pipeline_path)?;
        tracing::info!(
            "Mapping table loaded: {} features from {}",
            table.feature_count(),
            pipeline_path.display()
        );

        let mut models = Vec::with_capacity(manifest.models.len());
        for entry in &manifest.models {
            models.push(load_model(base, entry)?);
        }

        Self::from_parts(manifest, table, models)
    }

    /// Assemble a registry from already-loaded pieces
    pub fn from_parts(manifest: Manifest, table: MappingTable, models: Vec<ModelInfo>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(models.len());
        for (i, model) in models.iter().enumerate() {
            if index.insert(model.id.clone(), i).is_some() {
                return Err(AppError::ManifestError(format!("Duplicate model id: {}", model.id)));
            }
        }

        if !index.contains_key(&manifest.default_model) {
            return Err(AppError::ManifestError(format!(
                "default_model '{}' not found among loaded models",
                manifest.default_model
            )));
        }

        Ok(Self {
            manifest,
            encoder: FeatureEncoder::new(Arc::new(table)),
            models,
            index,
        })
    }

    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.index.get(id).map(|&i| &self.models[i])
    }

    pub fn require(&self, id: &str) -> AppResult<&ModelInfo> {
        self.get(id)
            .ok_or_else(|| AppError::UnknownModelError(id.to_string()))
    }

    /// The requested model, or every model in manifest order
    pub fn select(&self, requested: Option<&str>) -> AppResult<Vec<&ModelInfo>> {
        match requested {
            Some(id) => Ok(vec![self.require(id)?]),
            None => Ok(self.models.iter().collect()),
        }
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn default_model(&self) -> &str {
        &self.manifest.default_model
    }

    pub fn target_column(&self) -> &str {
        &self.manifest.target_column
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.manifest.feature_columns
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn mappings(&self) -> &MappingTable {
        self.encoder.table()
    }
}

/// Relative paths are resolved against the manifest's directory
fn resolve(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn load_model(base: &Path, entry: &ModelEntry) -> AppResult<ModelInfo> {
    let path = resolve(base, &entry.path);
    if !path.exists() {
        return Err(AppError::ManifestError(format!("Model not found: {}", path.display())));
    }

    if let Some(expected) = &entry.sha256 {
        let actual = compute_file_hash(&path)
            .map_err(|e| AppError::ManifestError(format!("Cannot hash {}: {}", path.display(), e)))?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(AppError::ManifestError(format!(
                "Checksum mismatch for model '{}': expected {}, got {}",
                entry.id, expected, actual
            )));
        }
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|e| AppError::ManifestError(format!("Cannot read {}: {}", path.display(), e)))?;
    let artifact: ModelArtifact = serde_json::from_str(&text).map_err(|e| {
        AppError::ManifestError(format!("Invalid model artifact {}: {}", path.display(), e))
    })?;
    let classifier = artifact.into_classifier()?;

    let hyperparams = match entry.hyperparams_path.as_deref().map(|p| resolve(base, p)) {
        Some(hp_path) if hp_path.exists() => {
            let text = std::fs::read_to_string(&hp_path).map_err(|e| {
                AppError::ManifestError(format!("Cannot read {}: {}", hp_path.display(), e))
            })?;
            serde_json::from_str(&text)?
        }
        _ => Value::Object(Default::default()),
    };

    tracing::info!(
        "Model loaded: {} ({}, {}, features: {})",
        entry.id,
        entry.technique_label(),
        if classifier.is_probabilistic() { "probabilistic" } else { "hard-label" },
        classifier
            .n_features()
            .map_or_else(|| "any".to_string(), |n| n.to_string())
    );

    Ok(ModelInfo {
        id: entry.id.clone(),
        technique: entry.technique_label(),
        hyperparams,
        classifier,
    })
}

/// Compute SHA256 hash of file
fn compute_file_hash(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
