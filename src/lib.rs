//! conll-graph: dependency graphs over CoNLL sentences
//!
//! Builds a linked head/dependent graph from the rows of one annotated
//! sentence, resolves coordination chains, and exports per-node feature
//! records for an external classifier.

pub mod config; // Session-wide settings
pub mod error;
pub mod features; // Feature records and chunk extraction
pub mod layout; // Row layouts and row parsing
pub mod node;
pub mod sentence; // Arena graph, linking, traversal and annotation

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use config::{Config, Normalizer};
pub use error::{BoxError, GraphError};
pub use features::{FeatureRecord, FeatureValue, Predictor, RecordVectorizer, Vectorizer};
pub use layout::{Layout, RowFields};
pub use node::{Node, TokenId};
pub use sentence::Sentence;
