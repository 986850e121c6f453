//! Arena trie of n-grams keyed oldest word first.
//!
//! Every node keeps a suffix link to the node of its path without the oldest word,
//! so shortening a context during backoff is a single step.

use crate::{error::CapacityError, vocabulary::WordId};

pub type NodeId = u32;

pub const ROOT: NodeId = 0;

/// Stored values of one n-gram
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NgramEntry {
    pub logprob: f32,
    pub backoff: Option<f32>,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// `None` for nodes created only to keep the trie closed
    pub(crate) logprob: Option<f32>,
    pub(crate) backoff: Option<f32>,
    pub(crate) suffix: NodeId,
    pub(crate) depth: u8,
    /// sorted by word id
    pub(crate) children: Vec<(WordId, NodeId)>,
}

impl Node {
    #[inline]
    fn new(suffix: NodeId, depth: u8) -> Self {
        Self {
            logprob: None,
            backoff: None,
            suffix,
            depth,
            children: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn child(&self, word: WordId) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&word, |&(w, _)| w)
            .ok()
            .map(|i| self.children[i].1)
    }

    #[inline]
    pub(crate) fn backoff_or_neutral(&self) -> f32 {
        self.backoff.unwrap_or(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct Trie {
    nodes: Vec<Node>,
    /// stored n-grams per order, index 0 for unigrams
    counts: Vec<usize>,
    implicit_nodes: usize,
}

impl Default for Trie {
    #[inline]
    fn default() -> Self {
        Self {
            nodes: vec![Node::new(ROOT, 0)],
            counts: Vec::new(),
            implicit_nodes: 0,
        }
    }
}

impl Trie {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Node of `path`, including nodes without an n-gram of their own
    pub(crate) fn find(&self, path: &[WordId]) -> Option<NodeId> {
        path.iter()
            .try_fold(ROOT, |node, &word| self.node(node).child(word))
    }

    /// Longest suffix of `path + word` present in the trie
    pub(crate) fn advance(&self, mut node: NodeId, word: WordId) -> NodeId {
        loop {
            let current = self.node(node);
            if let Some(child) = current.child(word) {
                return child;
            }
            if node == ROOT {
                return ROOT;
            }
            node = current.suffix;
        }
    }

    fn push_child(
        &mut self,
        parent: NodeId,
        word: WordId,
        suffix: NodeId,
    ) -> Result<NodeId, CapacityError> {
        let id = next_node_id(self.nodes.len())?;
        let depth = self.node(parent).depth + 1;
        self.nodes.push(Node::new(suffix, depth));
        let children = &mut self.nodes[parent as usize].children;
        let pos = children.partition_point(|&(w, _)| w < word);
        children.insert(pos, (word, id));
        Ok(id)
    }

    /// Walks `path` creating missing nodes, suffixes first
    fn ensure(&mut self, path: &[WordId]) -> Result<NodeId, CapacityError> {
        let mut node = ROOT;
        for (depth, &word) in path.iter().enumerate() {
            node = match self.node(node).child(word) {
                Some(child) => child,
                None => {
                    let suffix = if depth == 0 {
                        ROOT
                    } else {
                        self.ensure(&path[1..=depth])?
                    };
                    self.push_child(node, word, suffix)?
                }
            };
        }
        Ok(node)
    }

    /// Creates or overwrites the n-gram at `path`, an empty path is ignored.
    ///
    /// Missing prefixes and suffixes are created without an n-gram of their own
    /// and with a neutral backoff weight.
    /// Fails only once every [`NodeId`] is taken.
    pub fn insert(
        &mut self,
        path: &[WordId],
        logprob: f32,
        backoff: Option<f32>,
    ) -> Result<(), CapacityError> {
        if path.is_empty() {
            return Ok(());
        }

        let nodes_before = self.nodes.len();
        let id = self.ensure(path)?;
        let created = self.nodes.len() - nodes_before;
        let implicit = created - usize::from(id as usize >= nodes_before);
        if implicit > 0 {
            self.implicit_nodes += implicit;
            tracing::warn!(
                "{}-gram {path:?} is missing {implicit} lower order n-grams, created with neutral backoff",
                path.len()
            );
        }

        let node = &mut self.nodes[id as usize];
        if node.logprob.is_none() {
            if self.counts.len() < path.len() {
                self.counts.resize(path.len(), 0);
            }
            self.counts[path.len() - 1] += 1;
        }
        node.logprob = Some(logprob);
        node.backoff = backoff;
        Ok(())
    }

    /// Exact n-gram lookup
    pub fn lookup_exact(&self, path: &[WordId]) -> Option<NgramEntry> {
        if path.is_empty() {
            return None;
        }

        let node = self.node(self.find(path)?);
        node.logprob.map(|logprob| NgramEntry {
            logprob,
            backoff: node.backoff,
        })
    }

    /// One word extensions of `path` stored as n-grams, by ascending word id
    pub fn children_of(&self, path: &[WordId]) -> impl Iterator<Item = (WordId, f32)> + '_ {
        self.find(path)
            .into_iter()
            .flat_map(move |node| self.stored_children(node))
    }

    #[inline]
    pub(crate) fn stored_children(&self, node: NodeId) -> impl Iterator<Item = (WordId, f32)> + '_ {
        self.node(node)
            .children
            .iter()
            .filter_map(|&(word, child)| self.node(child).logprob.map(|lp| (word, lp)))
    }

    /// Stored n-grams per order, index 0 for unigrams
    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Nodes created for missing lower order n-grams
    #[inline]
    pub fn implicit_nodes(&self) -> usize {
        self.implicit_nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes
            .iter_mut()
            .for_each(|node| node.children.shrink_to_fit());
        self.nodes.shrink_to_fit();
    }
}

#[inline]
fn next_node_id(len: usize) -> Result<NodeId, CapacityError> {
    NodeId::try_from(len).map_err(|_| CapacityError::Nodes)
}
