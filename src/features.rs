//! Feature records and chunk extraction over classifier predictions
//!
//! Each node is turned into a small string-keyed record that an external
//! classifier consumes. The classifier is reached through two collaborators,
//! a [`Vectorizer`] that turns records into model input and a [`Predictor`]
//! that labels that input.

use crate::error::{BoxError, GraphError};
use crate::node::{Node, TokenId};
use crate::sentence::Sentence;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOKEN_KEY: &str = "TOK";
pub const LEMMA_KEY: &str = "LEM";
pub const POS_KEY: &str = "POS";
pub const DEPREL_KEY: &str = "DEP";

/// Value of one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Text(String),
    Flag(bool),
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

impl From<bool> for FeatureValue {
    fn from(b: bool) -> Self {
        FeatureValue::Flag(b)
    }
}

/// Features of one node, keyed by name
pub type FeatureRecord = BTreeMap<String, FeatureValue>;

/// Turns feature records into predictor input
pub trait Vectorizer {
    type Output;

    fn transform(&self, records: &[FeatureRecord]) -> Result<Self::Output, BoxError>;
}

/// Labels vectorized input, one boolean per record
pub trait Predictor<X> {
    fn predict(&self, input: &X) -> Result<Vec<bool>, BoxError>;
}

/// Passes records through unchanged, for predictors that read records directly
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordVectorizer;

impl Vectorizer for RecordVectorizer {
    type Output = Vec<FeatureRecord>;

    fn transform(&self, records: &[FeatureRecord]) -> Result<Self::Output, BoxError> {
        Ok(records.to_vec())
    }
}

impl Sentence {
    /// Feature record of `node`
    ///
    /// Besides TOK, LEM, POS and DEP, every decoration set on the node's head
    /// adds a `<deprel>-<decoration>` flag.
    pub fn node_features(&self, node: &Node) -> FeatureRecord {
        let mut record = FeatureRecord::new();
        record.insert(TOKEN_KEY.to_string(), node.token.as_str().into());
        record.insert(LEMMA_KEY.to_string(), node.lemma.as_str().into());
        record.insert(POS_KEY.to_string(), node.pos.as_str().into());
        record.insert(DEPREL_KEY.to_string(), node.deprel.as_str().into());

        if let Some(head) = self.head(node) {
            for decoration in head.active_decorations() {
                record.insert(format!("{}-{}", node.deprel, decoration), true.into());
            }
        }

        record
    }

    /// Feature records of all nodes in id order
    pub fn features(&self) -> Vec<FeatureRecord> {
        self.nodes().map(|node| self.node_features(node)).collect()
    }

    /// Classify every node and return the lemmas of each predicted span
    ///
    /// A node tagged with the configured preposition joins two spans when
    /// both of its neighbours were selected. Lemmas within a span are joined
    /// with `-`; spans come back in id order.
    pub fn tagged_lemmas<P, V>(
        &self,
        predictor: &P,
        vectorizer: &V,
        transliterate: bool,
    ) -> Result<Vec<String>, GraphError>
    where
        V: Vectorizer,
        P: Predictor<V::Output>,
    {
        let normalizer = self.normalizer(transliterate)?;

        let mut selected: FxHashSet<TokenId> = FxHashSet::default();
        for node in self.nodes() {
            let record = self.node_features(node);
            let input = vectorizer
                .transform(std::slice::from_ref(&record))
                .map_err(GraphError::Collaborator)?;
            let labels = predictor.predict(&input).map_err(GraphError::Collaborator)?;
            let label = *labels
                .first()
                .ok_or(GraphError::EmptyPrediction { id: node.id })?;
            tracing::trace!(id = node.id, label, "predicted");
            if label {
                selected.insert(node.id);
            }
        }

        // Interior positions only; a bridge can enable the next one
        let last = self.len() as TokenId;
        for id in 2..last {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.pos == self.config().preposition
                && selected.contains(&(id - 1))
                && selected.contains(&(id + 1))
            {
                selected.insert(id);
            }
        }

        let mut spans = Vec::new();
        let mut parts: Vec<String> = Vec::new();
        let mut previous: Option<TokenId> = None;
        for node in self.nodes() {
            if !selected.contains(&node.id) {
                flush(&mut parts, &mut spans);
                previous = None;
                continue;
            }
            if previous.is_some_and(|id| id + 1 != node.id) {
                flush(&mut parts, &mut spans);
            }
            let lemma = match &normalizer {
                Some(normalize) => {
                    normalize(node.lemma.as_str()).map_err(GraphError::Collaborator)?
                }
                None => node.lemma.clone(),
            };
            parts.push(lemma);
            previous = Some(node.id);
        }
        flush(&mut parts, &mut spans);

        Ok(spans)
    }
}

fn flush(parts: &mut Vec<String>, spans: &mut Vec<String>) {
    if !parts.is_empty() {
        spans.push(parts.join("-"));
        parts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::layout::Layout;
    use std::collections::HashMap;

    fn generic() -> Config {
        Config::default().with_layout(Layout::Generic)
    }

    fn sentence(rows: &[(TokenId, &str, &str, TokenId, &str)], config: &Config) -> Sentence {
        let rows: Vec<String> = rows
            .iter()
            .map(|(id, lemma, pos, head, deprel)| {
                format!("{id}\t{lemma}\t{lemma}\t{pos}\t{pos}\t_\t{head}\t{deprel}\t_\t_")
            })
            .collect();
        Sentence::from_rows(&rows, config).unwrap()
    }

    /// Selects nodes whose lemma is in a fixed list
    struct LemmaPredictor(Vec<&'static str>);

    impl Predictor<Vec<FeatureRecord>> for LemmaPredictor {
        fn predict(&self, input: &Vec<FeatureRecord>) -> Result<Vec<bool>, BoxError> {
            Ok(input
                .iter()
                .map(|record| match record.get(LEMMA_KEY) {
                    Some(FeatureValue::Text(lemma)) => self.0.contains(&lemma.as_str()),
                    _ => false,
                })
                .collect())
        }
    }

    struct SilentPredictor;

    impl Predictor<Vec<FeatureRecord>> for SilentPredictor {
        fn predict(&self, _input: &Vec<FeatureRecord>) -> Result<Vec<bool>, BoxError> {
            Ok(Vec::new())
        }
    }

    struct FailingVectorizer;

    impl Vectorizer for FailingVectorizer {
        type Output = ();

        fn transform(&self, _records: &[FeatureRecord]) -> Result<(), BoxError> {
            Err("vocabulary not fitted".into())
        }
    }

    struct AlwaysPredictor;

    impl Predictor<()> for AlwaysPredictor {
        fn predict(&self, _input: &()) -> Result<Vec<bool>, BoxError> {
            Ok(vec![true])
        }
    }

    fn keys(record: &FeatureRecord) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_features_without_head() {
        let s = sentence(&[(1, "sit", "V", 0, "root")], &generic());
        let record = s.node_features(s.node(1).unwrap());

        assert_eq!(keys(&record), vec!["DEP", "LEM", "POS", "TOK"]);
        assert_eq!(record["TOK"], FeatureValue::from("sit"));
        assert_eq!(record["DEP"], FeatureValue::from("root"));
    }

    #[test]
    fn test_features_with_decorated_head() {
        let mut s = sentence(&[(1, "cat", "N", 2, "subj"), (2, "sit", "V", 0, "root")], &generic());
        let decorations: HashMap<String, Vec<String>> =
            [("sit".to_string(), vec!["A".to_string(), "B".to_string()])]
                .into_iter()
                .collect();
        s.decorate(&decorations, None);

        let record = s.node_features(s.node(1).unwrap());
        assert_eq!(keys(&record), vec!["DEP", "LEM", "POS", "TOK", "subj-A", "subj-B"]);
        assert_eq!(record["subj-A"], FeatureValue::Flag(true));

        // The head's own record does not see its decorations
        let root = s.node_features(s.node(2).unwrap());
        assert_eq!(root.len(), 4);
    }

    #[test]
    fn test_false_decorations_are_not_features() {
        let mut s = sentence(&[(1, "cat", "N", 2, "subj"), (2, "sit", "V", 0, "root")], &generic());
        s.node_mut(2).unwrap().decorations.insert("A".to_string(), false);

        assert_eq!(s.node_features(s.node(1).unwrap()).len(), 4);
    }

    #[test]
    fn test_features_per_node() {
        let s = sentence(&[(1, "cat", "N", 2, "subj"), (2, "sit", "V", 0, "root")], &generic());
        let records = s.features();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["LEM"], FeatureValue::from("cat"));
        assert_eq!(records[1]["LEM"], FeatureValue::from("sit"));
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut record = FeatureRecord::new();
        record.insert("TOK".to_string(), "cat".into());
        record.insert("subj-A".to_string(), true.into());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"TOK":"cat","subj-A":true}"#);
    }

    #[test]
    fn test_tagged_lemmas_spans() {
        let s = sentence(
            &[
                (1, "the", "D", 3, "det"),
                (2, "red", "A", 3, "mod"),
                (3, "wine", "N", 4, "subj"),
                (4, "be", "V", 0, "root"),
                (5, "old", "A", 4, "ats"),
            ],
            &generic(),
        );
        let predictor = LemmaPredictor(vec!["red", "wine", "old"]);
        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, false).unwrap();

        assert_eq!(spans, vec!["red-wine", "old"]);
    }

    #[test]
    fn test_tagged_lemmas_preposition_bridge() {
        let s = sentence(
            &[
                (1, "glass", "N", 0, "root"),
                (2, "of", "P", 1, "dep"),
                (3, "wine", "N", 2, "obj"),
                (4, "on", "P", 1, "dep"),
                (5, "table", "N", 4, "obj"),
            ],
            &generic(),
        );
        let predictor = LemmaPredictor(vec!["glass", "wine"]);
        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, false).unwrap();
        assert_eq!(spans, vec!["glass-of-wine"]);
    }

    #[test]
    fn test_bridge_needs_preposition() {
        let s = sentence(
            &[
                (1, "glass", "N", 0, "root"),
                (2, "and", "C", 1, "coord"),
                (3, "wine", "N", 2, "dep_coord"),
            ],
            &generic(),
        );
        let predictor = LemmaPredictor(vec!["glass", "wine"]);
        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, false).unwrap();
        assert_eq!(spans, vec!["glass", "wine"]);
    }

    #[test]
    fn test_bridge_respects_configured_preposition() {
        let config = generic().with_preposition("ADP");
        let s = sentence(
            &[
                (1, "glass", "N", 0, "root"),
                (2, "of", "ADP", 1, "dep"),
                (3, "wine", "N", 2, "obj"),
            ],
            &config,
        );
        let predictor = LemmaPredictor(vec!["glass", "wine"]);
        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, false).unwrap();
        assert_eq!(spans, vec!["glass-of-wine"]);
    }

    #[test]
    fn test_last_node_closes_span() {
        let s = sentence(&[(1, "drink", "V", 0, "root"), (2, "wine", "N", 1, "obj")], &generic());
        let predictor = LemmaPredictor(vec!["wine"]);
        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, false).unwrap();
        assert_eq!(spans, vec!["wine"]);
    }

    #[test]
    fn test_no_predictions() {
        let s = sentence(&[(1, "drink", "V", 0, "root")], &generic());
        let spans = s
            .tagged_lemmas(&LemmaPredictor(vec![]), &RecordVectorizer, false)
            .unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_tagged_lemmas_transliterated() {
        let config = generic().with_normalizer(|lemma: &str| Ok(lemma.replace('é', "e")));
        let s = sentence(&[(1, "café", "N", 0, "root"), (2, "noir", "A", 1, "mod")], &config);
        let predictor = LemmaPredictor(vec!["café", "noir"]);

        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, true).unwrap();
        assert_eq!(spans, vec!["cafe-noir"]);

        let spans = s.tagged_lemmas(&predictor, &RecordVectorizer, false).unwrap();
        assert_eq!(spans, vec!["café-noir"]);
    }

    #[test]
    fn test_failing_normalizer_is_an_error() {
        let config = generic().with_normalizer(|lemma: &str| {
            Err(format!("no transliteration for {lemma}").into())
        });
        let s = sentence(&[(1, "café", "N", 0, "root")], &config);
        let predictor = LemmaPredictor(vec!["café"]);

        let err = s
            .tagged_lemmas(&predictor, &RecordVectorizer, true)
            .unwrap_err();
        assert!(matches!(err, GraphError::Collaborator(_)));
        assert_eq!(err.to_string(), "Collaborator failed: no transliteration for café");
    }

    #[test]
    fn test_empty_prediction_is_an_error() {
        let s = sentence(&[(1, "drink", "V", 0, "root")], &generic());
        let err = s
            .tagged_lemmas(&SilentPredictor, &RecordVectorizer, false)
            .unwrap_err();
        assert!(matches!(err, GraphError::EmptyPrediction { id: 1 }));
    }

    #[test]
    fn test_collaborator_failure_is_propagated() {
        let s = sentence(&[(1, "drink", "V", 0, "root")], &generic());
        let err = s
            .tagged_lemmas(&AlwaysPredictor, &FailingVectorizer, false)
            .unwrap_err();
        assert!(matches!(err, GraphError::Collaborator(_)));
        assert_eq!(err.to_string(), "Collaborator failed: vocabulary not fitted");
    }
}
