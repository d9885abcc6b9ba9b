//! Error type shared by row parsing and graph operations

use crate::node::TokenId;
use thiserror::Error;

/// Boxed error returned by external collaborators (vectorizer, predictor)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Invalid HEAD: {0}")]
    InvalidHead(String),

    /// A `coord` chain loops back on itself
    #[error("Coordination cycle reached from node {id}")]
    CoordinationCycle { id: TokenId },

    #[error("Transliteration requested but no normalizer is configured")]
    MissingNormalizer,

    #[error("Predictor returned no label for node {id}")]
    EmptyPrediction { id: TokenId },

    #[error("Collaborator failed: {0}")]
    Collaborator(#[source] BoxError),

    #[error("Unknown layout: {0}")]
    UnknownLayout(String),
}
