//! Token nodes of a dependency graph
//!
//! A node holds its raw row fields, its boolean annotations, and arena slots
//! for its out-edge (head) and in-edges (dependents). The slots are owned by
//! the enclosing [`Sentence`](crate::Sentence) and only filled by linking.

use crate::layout::RowFields;
use std::collections::BTreeMap;
use std::fmt;

/// Token position as written in the ID and HEAD columns
pub type TokenId = i64;

/// Index of a node in its sentence's arena
pub(crate) type Slot = usize;

/// One token and its single outgoing dependency edge
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: TokenId,
    pub token: String,
    pub lemma: String,
    pub pos: String,
    /// Raw HEAD column; 0 or an unknown id means no head
    pub head_id: TokenId,
    /// Relation label of the edge to the head
    pub deprel: String,
    pub decorations: BTreeMap<String, bool>,
    pub tags: BTreeMap<String, bool>,
    pub(crate) head: Option<Slot>,
    pub(crate) dependents: Vec<Slot>,
    pub(crate) previous: Option<TokenId>,
}

impl Node {
    /// Create an unlinked node
    pub fn new(
        id: TokenId,
        token: &str,
        lemma: &str,
        pos: &str,
        head_id: TokenId,
        deprel: &str,
    ) -> Self {
        Self {
            id,
            token: token.to_string(),
            lemma: lemma.to_string(),
            pos: pos.to_string(),
            head_id,
            deprel: deprel.to_string(),
            decorations: BTreeMap::new(),
            tags: BTreeMap::new(),
            head: None,
            dependents: Vec::new(),
            previous: None,
        }
    }

    pub(crate) fn from_row(row: RowFields) -> Self {
        Self::new(
            row.id,
            &row.token,
            &row.lemma,
            &row.pos,
            row.head_id,
            &row.deprel,
        )
    }

    /// Token position, fixed once the node is built
    ///
    /// The sentence indexes nodes by id, so it cannot be changed through
    /// [`Sentence::node_mut`](crate::Sentence::node_mut):
    ///
    /// ```compile_fail
    /// use conll_graph::{Config, Layout, Sentence};
    ///
    /// let config = Config::default().with_layout(Layout::Generic);
    /// let mut sentence =
    ///     Sentence::parse("1\tcat\tcat\tN\tN\t_\t0\troot\t_\t_", &config).unwrap();
    /// sentence.node_mut(1).unwrap().id = 7;
    /// ```
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Whether linking resolved `head_id` to a node
    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    /// Number of nodes attached to this one
    pub fn num_dependents(&self) -> usize {
        self.dependents.len()
    }

    /// Id of the node constructed just before this one, if any
    pub fn previous_id(&self) -> Option<TokenId> {
        self.previous
    }

    pub fn decoration(&self, name: &str) -> bool {
        self.decorations.get(name).copied().unwrap_or(false)
    }

    pub fn decorate(&mut self, name: &str) {
        self.decorations.insert(name.to_string(), true);
    }

    pub fn tag(&self, name: &str) -> bool {
        self.tags.get(name).copied().unwrap_or(false)
    }

    pub fn set_tag(&mut self, name: &str) {
        self.tags.insert(name.to_string(), true);
    }

    /// Decoration names set to true, in key order
    pub fn active_decorations(&self) -> impl Iterator<Item = &str> {
        self.decorations
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
    }
}

/// Canonical row: ID TOKEN LEMMA POS HEAD DEPREL DECORATIONS TAGS
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decorations: Vec<&str> = self.decorations.keys().map(String::as_str).collect();
        let tags: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.token,
            self.lemma,
            self.pos,
            self.head_id,
            self.deprel,
            decorations.join(","),
            tags.join(",")
        )
    }
}
