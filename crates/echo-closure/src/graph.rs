// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory adjacency index built from the incoming edge stream.
//!
//! Node ids are interned into dense `u32` indices in first-seen order so that
//! adjacency lists, the reverse index and the edge set stay compact even for
//! tens of millions of edges. The id values themselves are stored once per
//! node and never coerced.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ResourceError;

/// Dense index of an interned node.
pub type NodeIndex = u32;

/// Result of [`ClosureGraph::insert_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// The edge was new and has been stored.
    Inserted,
    /// The edge was already present; nothing changed.
    Duplicate,
}

/// Directed graph of parent → child edges with idempotent insert.
#[derive(Debug, Clone)]
pub struct ClosureGraph<V> {
    /// Value → dense index.
    index: FxHashMap<V, NodeIndex>,
    /// Dense index → value, in first-seen order.
    nodes: Vec<V>,
    /// Forward adjacency, insertion ordered.
    children: Vec<Vec<NodeIndex>>,
    /// Reverse adjacency, insertion ordered.
    parents: Vec<Vec<NodeIndex>>,
    /// Packed `(parent, child)` keys of every stored edge.
    edges: FxHashSet<u64>,
    max_edges: Option<u64>,
}

impl<V> Default for ClosureGraph<V> {
    fn default() -> Self {
        Self {
            index: FxHashMap::default(),
            nodes: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
            edges: FxHashSet::default(),
            max_edges: None,
        }
    }
}

#[inline]
fn edge_key(parent: NodeIndex, child: NodeIndex) -> u64 {
    (u64::from(parent) << 32) | u64::from(child)
}

impl<V> ClosureGraph<V>
where
    V: Eq + Hash + Clone,
{
    /// Creates an empty graph with no edge limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph that refuses to hold more than `limit` edges.
    pub fn with_max_edges(limit: u64) -> Self {
        Self {
            max_edges: Some(limit),
            ..Self::default()
        }
    }

    /// Number of distinct nodes seen as parent or child.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges stored.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if no edge has been inserted.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Adds the directed edge `parent → child`.
    ///
    /// Inserting an edge that is already present is a no-op reported as
    /// [`EdgeInsert::Duplicate`]. Self-loops are stored like any other edge.
    ///
    /// # Errors
    ///
    /// [`ResourceError::EdgeLimit`] if the edge is new and the configured limit
    /// is reached, [`ResourceError::NodeIndexOverflow`] if a new node cannot be
    /// indexed. The graph is left unchanged on error.
    pub fn insert_edge(&mut self, parent: V, child: V) -> Result<EdgeInsert, ResourceError> {
        let existing_parent = self.index.get(&parent).copied();
        let existing_child = self.index.get(&child).copied();
        if let (Some(p), Some(c)) = (existing_parent, existing_child) {
            if self.edges.contains(&edge_key(p, c)) {
                return Ok(EdgeInsert::Duplicate);
            }
        }

        if let Some(limit) = self.max_edges {
            if self.edges.len() as u64 >= limit {
                return Err(ResourceError::EdgeLimit { limit });
            }
        }
        let new_nodes = usize::from(existing_parent.is_none())
            + usize::from(existing_child.is_none() && parent != child);
        if self.nodes.len() + new_nodes > NodeIndex::MAX as usize {
            return Err(ResourceError::NodeIndexOverflow);
        }

        let p = match existing_parent {
            Some(p) => p,
            None => self.intern(parent),
        };
        let c = match existing_child {
            Some(c) => c,
            None => self.intern(child),
        };
        self.edges.insert(edge_key(p, c));
        self.children[p as usize].push(c);
        self.parents[c as usize].push(p);
        Ok(EdgeInsert::Inserted)
    }

    fn intern(&mut self, value: V) -> NodeIndex {
        if let Some(&idx) = self.index.get(&value) {
            return idx;
        }
        // Capacity was checked by the caller.
        #[allow(clippy::cast_possible_truncation)]
        let idx = self.nodes.len() as NodeIndex;
        self.index.insert(value.clone(), idx);
        self.nodes.push(value);
        self.children.push(Vec::new());
        self.parents.push(Vec::new());
        idx
    }

    /// Returns `true` if the edge `parent → child` is stored.
    pub fn contains_edge(&self, parent: &V, child: &V) -> bool {
        match (self.index.get(parent), self.index.get(child)) {
            (Some(&p), Some(&c)) => self.edges.contains(&edge_key(p, c)),
            _ => false,
        }
    }

    /// Direct children of `node`, in insertion order.
    pub fn children_of<'a>(&'a self, node: &V) -> impl Iterator<Item = &'a V> + 'a {
        let list = self
            .index
            .get(node)
            .map_or(&[][..], |&i| self.children[i as usize].as_slice());
        list.iter().map(move |&c| &self.nodes[c as usize])
    }

    /// Direct parents of `node`, in insertion order.
    pub fn parents_of<'a>(&'a self, node: &V) -> impl Iterator<Item = &'a V> + 'a {
        let list = self
            .index
            .get(node)
            .map_or(&[][..], |&i| self.parents[i as usize].as_slice());
        list.iter().map(move |&p| &self.nodes[p as usize])
    }

    /// Returns `true` if `node` has outgoing edges and no incoming edge.
    pub fn is_root(&self, node: &V) -> bool {
        self.index
            .get(node)
            .is_some_and(|&i| self.is_root_index(i))
    }

    /// Nodes that appear as a parent but never as a child, in first-seen order.
    pub fn roots(&self) -> impl Iterator<Item = &V> + '_ {
        self.root_indices().map(move |i| &self.nodes[i as usize])
    }

    /// Every node in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &V> + '_ {
        self.nodes.iter()
    }
}

impl<V> ClosureGraph<V> {
    pub(crate) fn node(&self, index: NodeIndex) -> &V {
        &self.nodes[index as usize]
    }

    pub(crate) fn children_at(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.children[index as usize]
    }

    pub(crate) fn len_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn is_root_index(&self, index: NodeIndex) -> bool {
        !self.children[index as usize].is_empty() && self.parents[index as usize].is_empty()
    }

    pub(crate) fn root_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len())
            .filter_map(|i| NodeIndex::try_from(i).ok())
            .filter(move |&i| self.is_root_index(i))
    }
}
