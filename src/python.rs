//! Python bindings for conll-graph
//!
//! Exposes `Sentence` and `Node`. `tagged_lemmas` accepts any classifier and
//! vectorizer following the scikit-learn `predict` / `transform` protocol.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::Config;
use crate::error::{BoxError, GraphError};
use crate::features::{FeatureRecord, FeatureValue, Predictor, Vectorizer};
use crate::node::{Node as RustNode, TokenId};
use crate::sentence::Sentence as RustSentence;

/// Convert GraphError to Python exception
impl From<GraphError> for PyErr {
    fn from(err: GraphError) -> PyErr {
        match err {
            GraphError::Collaborator(e) => PyRuntimeError::new_err(e.to_string()),
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

fn record_to_dict<'py>(py: Python<'py>, record: &FeatureRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (key, value) in record {
        match value {
            FeatureValue::Text(text) => dict.set_item(key, text)?,
            FeatureValue::Flag(flag) => dict.set_item(key, *flag)?,
        }
    }
    Ok(dict)
}

/// Calls `vectorizer.transform([record])`
struct PyVectorizer<'py>(Bound<'py, PyAny>);

impl<'py> Vectorizer for PyVectorizer<'py> {
    type Output = Bound<'py, PyAny>;

    fn transform(&self, records: &[FeatureRecord]) -> Result<Self::Output, BoxError> {
        let py = self.0.py();
        let list = PyList::empty(py);
        for record in records {
            list.append(record_to_dict(py, record)?)?;
        }
        Ok(self.0.call_method1("transform", (list,))?)
    }
}

/// Calls `classifier.predict(input)` and reads the result as truth values
struct PyPredictor<'py>(Bound<'py, PyAny>);

impl<'a, 'py> Predictor<Bound<'a, PyAny>> for PyPredictor<'py> {
    fn predict(&self, input: &Bound<'a, PyAny>) -> Result<Vec<bool>, BoxError> {
        let labels = self.0.call_method1("predict", (input,))?;
        let mut result = Vec::new();
        for label in labels.try_iter()? {
            result.push(label?.is_truthy()?);
        }
        Ok(result)
    }
}

#[pyclass(name = "Node")]
#[derive(Clone)]
pub struct PyNode {
    #[pyo3(get)]
    id: TokenId,
    #[pyo3(get)]
    token: String,
    #[pyo3(get)]
    lemma: String,
    #[pyo3(get)]
    pos: String,
    #[pyo3(get)]
    head_id: TokenId,
    #[pyo3(get)]
    deprel: String,
    #[pyo3(get)]
    decorations: BTreeMap<String, bool>,
    #[pyo3(get)]
    tags: BTreeMap<String, bool>,
    /// Resolved head, None for roots and dangling heads
    #[pyo3(get)]
    head: Option<TokenId>,
    #[pyo3(get)]
    dependents: Vec<TokenId>,
    line: String,
}

impl PyNode {
    fn new(sentence: &RustSentence, node: &RustNode) -> Self {
        Self {
            id: node.id,
            token: node.token.clone(),
            lemma: node.lemma.clone(),
            pos: node.pos.clone(),
            head_id: node.head_id,
            deprel: node.deprel.clone(),
            decorations: node.decorations.clone(),
            tags: node.tags.clone(),
            head: sentence.head(node).map(|head| head.id),
            dependents: sentence.dependents(node).map(|dep| dep.id).collect(),
            line: node.to_string(),
        }
    }
}

#[pymethods]
impl PyNode {
    fn __str__(&self) -> String {
        self.line.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Node id={} token='{}' lemma='{}' pos='{}' deprel='{}'>",
            self.id, self.token, self.lemma, self.pos, self.deprel
        )
    }
}

#[pyclass(name = "Sentence")]
pub struct PySentence {
    inner: RustSentence,
}

#[pymethods]
impl PySentence {
    #[new]
    #[pyo3(signature = (rows, layout=None, normalizer=None, default_tag=None))]
    fn new(
        rows: Vec<String>,
        layout: Option<&str>,
        normalizer: Option<Py<PyAny>>,
        default_tag: Option<&str>,
    ) -> PyResult<Self> {
        let mut config = Config::new();
        if let Some(layout) = layout {
            config = config.with_layout(layout.parse()?);
        }
        if let Some(tag) = default_tag {
            config = config.with_default_tag(tag);
        }
        if let Some(normalizer) = normalizer {
            config = config.with_normalizer(move |lemma: &str| {
                Python::attach(|py| {
                    normalizer
                        .call1(py, (lemma,))
                        .and_then(|result| result.bind(py).extract::<String>())
                })
                .map_err(BoxError::from)
            });
        }
        Ok(Self {
            inner: RustSentence::from_rows(&rows, &config)?,
        })
    }

    fn link(&mut self) {
        self.inner.link();
    }

    fn distribute_coordinations(&mut self) -> PyResult<()> {
        Ok(self.inner.distribute_coordinations()?)
    }

    #[pyo3(signature = (pos=None, decoration=None))]
    fn get_nodes(&self, pos: Option<&str>, decoration: Option<&str>) -> Vec<PyNode> {
        self.inner
            .get_nodes(pos, decoration)
            .map(|node| PyNode::new(&self.inner, node))
            .collect()
    }

    fn node(&self, id: TokenId) -> Option<PyNode> {
        self.inner.node(id).map(|node| PyNode::new(&self.inner, node))
    }

    #[pyo3(signature = (lemmas, tag=None, transliterate=false))]
    fn tag_lemmas(
        &mut self,
        lemmas: HashSet<String>,
        tag: Option<&str>,
        transliterate: bool,
    ) -> PyResult<()> {
        Ok(self.inner.tag_lemmas(&lemmas, tag, transliterate)?)
    }

    #[pyo3(signature = (lemma_decorations, pos=None))]
    fn decorate(&mut self, lemma_decorations: HashMap<String, Vec<String>>, pos: Option<&str>) {
        self.inner.decorate(&lemma_decorations, pos);
    }

    #[pyo3(signature = (tag=None))]
    fn tags(&self, tag: Option<&str>) -> Vec<bool> {
        self.inner.tags(tag)
    }

    fn features<'py>(&self, py: Python<'py>) -> PyResult<Vec<Bound<'py, PyDict>>> {
        self.inner
            .features()
            .iter()
            .map(|record| record_to_dict(py, record))
            .collect()
    }

    #[pyo3(signature = (classifier, vectorizer, transliterate=false))]
    fn tagged_lemmas(
        &self,
        classifier: Bound<'_, PyAny>,
        vectorizer: Bound<'_, PyAny>,
        transliterate: bool,
    ) -> PyResult<Vec<String>> {
        Ok(self.inner.tagged_lemmas(
            &PyPredictor(classifier),
            &PyVectorizer(vectorizer),
            transliterate,
        )?)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        let n = self.inner.len();
        if n == 0 {
            return "<Sentence (empty)>".to_string();
        }

        let tokens: Vec<&str> = self
            .inner
            .nodes()
            .take(3)
            .map(|node| node.token.as_str())
            .collect();

        if n > 3 {
            format!("<Sentence len={} tokens='{} ...'>", n, tokens.join(" "))
        } else {
            format!("<Sentence len={} tokens='{}'>", n, tokens.join(" "))
        }
    }
}

#[pyfunction]
fn __version__() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn conll_graph(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySentence>()?;
    m.add_class::<PyNode>()?;

    m.add_function(wrap_pyfunction!(__version__, m)?)?;

    Ok(())
}
