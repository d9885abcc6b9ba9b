//! Session-wide settings for building and annotating sentences

use crate::error::BoxError;
use crate::layout::Layout;
use std::fmt;
use std::sync::Arc;

/// Lemma normalizer, e.g. a transliteration to ASCII
pub type Normalizer = Arc<dyn Fn(&str) -> Result<String, BoxError> + Send + Sync>;

/// Configuration shared by every sentence of a parsing session
#[derive(Clone)]
pub struct Config {
    /// Column layout of input rows
    pub layout: Layout,
    /// Relation label linking one conjunct to the previous one
    pub coordination: String,
    /// Relation label of a dependent shared by coordinated heads
    pub coordinated_dependent: String,
    /// POS tag allowed to bridge two predicted spans
    pub preposition: String,
    /// Tag name used by tagging and tag lookup when none is given
    pub default_tag: String,
    /// Applied to lemmas when transliteration is requested
    pub normalizer: Option<Normalizer>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            coordination: "coord".to_string(),
            coordinated_dependent: "dep_coord".to_string(),
            preposition: "P".to_string(),
            default_tag: "T".to_string(),
            normalizer: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_coordination(mut self, coordination: &str, coordinated_dependent: &str) -> Self {
        self.coordination = coordination.to_string();
        self.coordinated_dependent = coordinated_dependent.to_string();
        self
    }

    pub fn with_preposition(mut self, preposition: &str) -> Self {
        self.preposition = preposition.to_string();
        self
    }

    pub fn with_default_tag(mut self, tag: &str) -> Self {
        self.default_tag = tag.to_string();
        self
    }

    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("layout", &self.layout)
            .field("coordination", &self.coordination)
            .field("coordinated_dependent", &self.coordinated_dependent)
            .field("preposition", &self.preposition)
            .field("default_tag", &self.default_tag)
            .field("normalizer", &self.normalizer.is_some())
            .finish()
    }
}
