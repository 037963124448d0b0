//! Mapping Table - Pre-computed category -> risk score lookups
//!
//! Loaded once at startup and shared read-only afterwards. The
//! `Hub_x_Dest` interaction is stored on disk as `[hub, dest, value]`
//! triples; it is flattened into a direct map while loading, so a shared
//! table only ever exposes the lookup form.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::{AppError, AppResult};

/// Value used for any key the table does not know
pub const UNKNOWN_RISK: f64 = 0.0;

/// Mapping name of the hub/destination interaction
pub const HUB_X_DEST: &str = "Hub_x_Dest";

pub type CategoryMap = HashMap<String, f64>;

#[derive(Debug, Clone)]
pub struct MappingTable {
    features: HashMap<String, CategoryMap>,
    raw: Value,
}

impl MappingTable {
    /// Table with no mappings; every lookup yields `UNKNOWN_RISK`
    pub fn empty() -> Self {
        Self {
            features: HashMap::new(),
            raw: Value::Object(Default::default()),
        }
    }

    /// Read and convert a mapping file
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::ManifestError(format!("Cannot read mappings {}: {}", path.display(), e))
        })?;
        let raw: Value = serde_json::from_str(&text).map_err(|e| {
            AppError::ManifestError(format!("Invalid mappings {}: {}", path.display(), e))
        })?;
        Self::from_json(raw)
    }

    /// Build the lookup form from the at-rest JSON document
    pub fn from_json(raw: Value) -> AppResult<Self> {
        let entries = raw.as_object().ok_or_else(|| {
            AppError::ManifestError("Mapping table must be a JSON object".to_string())
        })?;

        let mut features = HashMap::with_capacity(entries.len());
        for (name, value) in entries {
            let map = match value {
                Value::Object(obj) => parse_category_map(name, obj)?,
                Value::Array(items) if name == HUB_X_DEST => parse_interaction_triples(items)?,
                _ => {
                    tracing::warn!("Skipping mapping '{}': unsupported layout", name);
                    continue;
                }
            };
            features.insert(name.clone(), map);
        }

        Ok(Self { features, raw })
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    pub fn get(&self, feature: &str) -> Option<&CategoryMap> {
        self.features.get(feature)
    }

    /// Risk score for `key` under `feature`, `UNKNOWN_RISK` when either is missing
    pub fn lookup(&self, feature: &str, key: &str) -> f64 {
        self.features
            .get(feature)
            .and_then(|m| m.get(key))
            .copied()
            .unwrap_or(UNKNOWN_RISK)
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// The document exactly as it was read from disk
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

fn parse_category_map(name: &str, obj: &serde_json::Map<String, Value>) -> AppResult<CategoryMap> {
    let mut map = CategoryMap::with_capacity(obj.len());
    for (key, value) in obj {
        // null scores behave like unknown keys
        if value.is_null() {
            continue;
        }
        let score = value.as_f64().ok_or_else(|| {
            AppError::ManifestError(format!(
                "Mapping '{}' has non-numeric score for key '{}'",
                name, key
            ))
        })?;
        map.insert(key.clone(), score);
    }
    Ok(map)
}

fn parse_interaction_triples(items: &[Value]) -> AppResult<CategoryMap> {
    let mut map = CategoryMap::with_capacity(items.len());
    for item in items {
        let Some([hub, dest, value]) = item.as_array().map(Vec::as_slice).and_then(triple) else {
            continue;
        };
        let score = value.as_f64().ok_or_else(|| {
            AppError::ManifestError(format!(
                "Mapping '{}' has non-numeric score for {}_{}",
                HUB_X_DEST, hub, dest
            ))
        })?;
        map.insert(format!("{}_{}", json_text(hub), json_text(dest)), score);
    }
    Ok(map)
}

fn triple(items: &[Value]) -> Option<&[Value; 3]> {
    items.try_into().ok()
}

/// Text form of a scalar JSON value, as used for mapping keys
pub fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
