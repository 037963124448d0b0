//! Features Module - Flight record preprocessing
//!
//! Turns raw flight rows into the risk-score vectors the classifiers
//! were trained on, using the pre-computed mapping table.

pub mod layout;
pub mod mapping;
pub mod encoder;

#[cfg(test)]
mod tests;

// Re-export common types
pub use encoder::{FeatureEncoder, FeatureMatrix, RawBatch};
pub use mapping::MappingTable;
