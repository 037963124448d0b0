//! Data models

pub mod manifest;
pub mod catalog;
pub mod prediction;
pub mod evaluation;

pub use manifest::*;
pub use catalog::*;
pub use prediction::*;
pub use evaluation::*;
