//! Sentence graphs
//!
//! A [`Sentence`] owns its nodes in an arena sorted by token id. Edges are
//! arena slots, and the only source of truth for them is each node's
//! `head_id`: [`Sentence::link`] throws every edge away and rebuilds both
//! directions from scratch, so stale back-references cannot survive and
//! cycles in the data are harmless.

use crate::config::{Config, Normalizer};
use crate::error::GraphError;
use crate::node::{Node, Slot, TokenId};
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;

/// One parsed sentence
#[derive(Debug, Clone)]
pub struct Sentence {
    nodes: Vec<Node>,
    index: FxHashMap<TokenId, Slot>,
    config: Config,
}

impl Sentence {
    /// Build a linked sentence from raw rows
    ///
    /// Rows whose field count does not fit `config.layout` are skipped. A
    /// non-numeric ID or HEAD aborts construction.
    pub fn from_rows<I, S>(rows: I, config: &Config) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut nodes = Vec::new();
        for row in rows {
            if let Some(fields) = config.layout.parse_row(row.as_ref())? {
                nodes.push(Node::from_row(fields));
            }
        }
        Ok(Self::from_nodes(nodes, config))
    }

    /// Build a linked sentence from a newline-separated block of rows
    pub fn parse(text: &str, config: &Config) -> Result<Self, GraphError> {
        Self::from_rows(text.lines(), config)
    }

    /// Build a linked sentence from nodes in input order
    ///
    /// A repeated id replaces the earlier node.
    pub fn from_nodes<I>(nodes: I, config: &Config) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        let mut by_id: FxHashMap<TokenId, Node> = FxHashMap::default();
        let mut previous = None;
        for mut node in nodes {
            node.head = None;
            node.dependents.clear();
            node.previous = previous;
            previous = Some(node.id);
            by_id.insert(node.id, node);
        }

        let mut nodes: Vec<Node> = by_id.into_values().collect();
        nodes.sort_by_key(|node| node.id);
        let index = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id, slot))
            .collect();

        let mut sentence = Self {
            nodes,
            index,
            config: config.clone(),
        };
        sentence.link();
        sentence
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve every `head_id` into head and dependent edges
    ///
    /// Full rebuild; calling it repeatedly gives the same graph.
    pub fn link(&mut self) {
        for node in &mut self.nodes {
            node.head = None;
            node.dependents.clear();
        }

        for slot in 0..self.nodes.len() {
            let Some(&target) = self.index.get(&self.nodes[slot].head_id) else {
                continue;
            };
            self.nodes[slot].head = Some(target);
            let dependents = &mut self.nodes[target].dependents;
            if !dependents.contains(&slot) {
                dependents.push(slot);
            }
        }
    }

    /// All nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Nodes in ascending id order, optionally restricted to a POS tag and/or
    /// a decoration that is set
    pub fn get_nodes<'a>(
        &'a self,
        pos: Option<&'a str>,
        decoration: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |node| pos.is_none_or(|pos| node.pos == pos))
            .filter(move |node| decoration.is_none_or(|name| node.decoration(name)))
    }

    pub fn node(&self, id: TokenId) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Mutable access to a node; call [`Sentence::link`] after changing `head_id`
    pub fn node_mut(&mut self, id: TokenId) -> Option<&mut Node> {
        self.index.get(&id).map(|&slot| &mut self.nodes[slot])
    }

    /// The head of `node`, if linking resolved one
    pub fn head(&self, node: &Node) -> Option<&Node> {
        node.head.and_then(|slot| self.nodes.get(slot))
    }

    /// Nodes whose head is `node`, in ascending id order
    pub fn dependents<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.dependents
            .iter()
            .filter_map(|&slot| self.nodes.get(slot))
    }

    /// The node constructed just before `node`
    pub fn previous(&self, node: &Node) -> Option<&Node> {
        node.previous.and_then(|id| self.node(id))
    }

    /// Reattach shared dependents of coordinated heads
    ///
    /// A node labelled with the coordinated-dependent marker follows its head
    /// through every edge labelled with the coordination marker, then takes
    /// the label and id of the last node reached. The graph is relinked
    /// afterwards, also when a coordination cycle aborts the rewrite.
    pub fn distribute_coordinations(&mut self) -> Result<(), GraphError> {
        let result = self.rewrite_coordinated_dependents();
        self.link();
        result
    }

    fn rewrite_coordinated_dependents(&mut self) -> Result<(), GraphError> {
        // No acyclic chain can take more hops than there are nodes
        let limit = self.nodes.len();

        for slot in 0..self.nodes.len() {
            let node = &self.nodes[slot];
            if node.deprel != self.config.coordinated_dependent {
                continue;
            }
            let Some(mut current) = node.head else {
                continue;
            };
            let id = node.id;

            let mut hops = 0;
            loop {
                let conjunct = &self.nodes[current];
                match conjunct.head {
                    Some(next) if conjunct.deprel == self.config.coordination => {
                        hops += 1;
                        if hops >= limit {
                            return Err(GraphError::CoordinationCycle { id });
                        }
                        current = next;
                    }
                    _ => break,
                }
            }

            let target = &self.nodes[current];
            let (deprel, head_id) = (target.deprel.clone(), target.id);
            tracing::debug!(id, head_id, deprel = %deprel, hops, "distributing coordination");

            let node = &mut self.nodes[slot];
            node.deprel = deprel;
            node.head_id = head_id;
        }

        Ok(())
    }

    /// Set `tag` (or the configured default tag) on every node whose lemma
    /// is in `lemmas`
    ///
    /// With `transliterate`, lemmas pass through the configured normalizer
    /// before the lookup; a failing normalizer aborts the pass. Existing tags
    /// are never cleared.
    pub fn tag_lemmas<S: BuildHasher>(
        &mut self,
        lemmas: &HashSet<String, S>,
        tag: Option<&str>,
        transliterate: bool,
    ) -> Result<(), GraphError> {
        let normalizer = self.normalizer(transliterate)?;
        let Self { nodes, config, .. } = self;
        let tag = tag.unwrap_or(&config.default_tag);

        for node in nodes.iter_mut() {
            let hit = match &normalizer {
                Some(normalize) => {
                    let lemma = normalize(node.lemma.as_str())
                        .map_err(GraphError::Collaborator)?;
                    lemmas.contains(&lemma)
                }
                None => lemmas.contains(&node.lemma),
            };
            if hit {
                node.set_tag(tag);
            }
        }
        Ok(())
    }

    /// Attach decorations by lemma lookup, optionally only on nodes with `pos`
    pub fn decorate<D, S>(&mut self, lemma_decorations: &HashMap<String, D, S>, pos: Option<&str>)
    where
        S: BuildHasher,
        for<'d> &'d D: IntoIterator<Item = &'d String>,
    {
        for node in &mut self.nodes {
            if pos.is_some_and(|pos| node.pos != pos) {
                continue;
            }
            if let Some(decorations) = lemma_decorations.get(&node.lemma) {
                for decoration in decorations {
                    node.decorate(decoration);
                }
            }
        }
    }

    /// Whether each node carries `tag` (or the configured default tag), in
    /// id order
    pub fn tags(&self, tag: Option<&str>) -> Vec<bool> {
        let tag = tag.unwrap_or(&self.config.default_tag);
        self.nodes.iter().map(|node| node.tag(tag)).collect()
    }

    /// The normalizer to apply to lemmas, if transliteration is requested
    pub(crate) fn normalizer(&self, transliterate: bool) -> Result<Option<Normalizer>, GraphError> {
        if !transliterate {
            return Ok(None);
        }
        self.config
            .normalizer
            .clone()
            .map(Some)
            .ok_or(GraphError::MissingNormalizer)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
