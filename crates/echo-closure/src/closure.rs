// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! All-pairs reachability with minimum distance.
//!
//! One breadth-first traversal runs from every node that has outgoing edges.
//! The first time a node is reached from an origin is at its minimum depth, so
//! each `(origin, reached)` pair is recorded exactly once and never expanded
//! again. The origin itself is marked visited before the traversal starts:
//! cycles therefore terminate and never produce `(a, a, d)` rows. The one
//! exception is an explicit self-loop edge, which yields `(a, a, 1)` like any
//! other direct edge.
//!
//! Output order is deterministic: origins in first-seen order, breadth-first
//! order within an origin, root self-rows last.

use std::hash::Hash;

use crate::error::ResourceError;
use crate::graph::{ClosureGraph, NodeIndex};

/// One row of the closure relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosurePair<V> {
    /// Node the path starts from.
    pub ancestor: V,
    /// Node the path ends at.
    pub descendant: V,
    /// Minimum number of edges on any path; `0` only for root self-rows.
    pub distance: u32,
}

/// Knobs for [`compute_closure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosurePolicy {
    /// Emit `(root, root, 0)` for every node with no incoming edge.
    pub root_id_zero: bool,
    /// Upper bound on the number of pairs.
    pub max_pairs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexedPair {
    pub(crate) ancestor: NodeIndex,
    pub(crate) descendant: NodeIndex,
    pub(crate) distance: u32,
}

/// Computed closure, stored as node indices of the graph it came from.
///
/// Resolve it only against that same graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    pairs: Vec<IndexedPair>,
}

impl Closure {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pair was produced.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs resolved to the node values of `graph`.
    pub fn pairs<'g, V>(
        &'g self,
        graph: &'g ClosureGraph<V>,
    ) -> impl Iterator<Item = ClosurePair<&'g V>> + 'g {
        self.pairs.iter().map(move |p| ClosurePair {
            ancestor: graph.node(p.ancestor),
            descendant: graph.node(p.descendant),
            distance: p.distance,
        })
    }

    /// Pairs resolved and cloned out of `graph`.
    pub fn to_pairs<V: Clone>(&self, graph: &ClosureGraph<V>) -> Vec<ClosurePair<V>> {
        self.pairs(graph)
            .map(|p| ClosurePair {
                ancestor: p.ancestor.clone(),
                descendant: p.descendant.clone(),
                distance: p.distance,
            })
            .collect()
    }

    pub(crate) fn get(&self, index: usize) -> Option<IndexedPair> {
        self.pairs.get(index).copied()
    }
}

struct PairSink {
    pairs: Vec<IndexedPair>,
    limit: Option<u64>,
}

impl PairSink {
    fn push(
        &mut self,
        ancestor: NodeIndex,
        descendant: NodeIndex,
        distance: u32,
    ) -> Result<(), ResourceError> {
        if let Some(limit) = self.limit {
            if self.pairs.len() as u64 >= limit {
                return Err(ResourceError::PairLimit { limit });
            }
        }
        self.pairs.push(IndexedPair {
            ancestor,
            descendant,
            distance,
        });
        Ok(())
    }
}

/// Computes every `(ancestor, descendant, minimum distance)` pair of `graph`.
///
/// Runs in `O(V + E)` per origin. Never blocks and never yields.
///
/// # Errors
///
/// [`ResourceError::PairLimit`] when `policy.max_pairs` is exceeded.
pub fn compute_closure<V>(
    graph: &ClosureGraph<V>,
    policy: &ClosurePolicy,
) -> Result<Closure, ResourceError>
where
    V: Eq + Hash + Clone,
{
    let node_count = graph.len_nodes();
    let mut sink = PairSink {
        pairs: Vec::with_capacity(graph.edge_count()),
        limit: policy.max_pairs,
    };
    // Generation stamps avoid clearing a visited set per origin.
    let mut visited: Vec<u32> = vec![0; node_count];
    let mut generation: u32 = 0;
    let mut frontier: Vec<NodeIndex> = Vec::new();
    let mut next: Vec<NodeIndex> = Vec::new();

    for origin in (0..node_count).filter_map(|i| NodeIndex::try_from(i).ok()) {
        if graph.children_at(origin).is_empty() {
            continue;
        }
        generation += 1;
        visited[origin as usize] = generation;
        frontier.clear();
        frontier.push(origin);
        let mut depth: u32 = 0;

        while !frontier.is_empty() {
            depth += 1;
            next.clear();
            for &node in &frontier {
                for &child in graph.children_at(node) {
                    if visited[child as usize] == generation {
                        if depth == 1 && child == origin {
                            sink.push(origin, origin, 1)?;
                        }
                        continue;
                    }
                    visited[child as usize] = generation;
                    sink.push(origin, child, depth)?;
                    next.push(child);
                }
            }
            std::mem::swap(&mut frontier, &mut next);
        }
    }

    if policy.root_id_zero {
        for root in graph.root_indices() {
            sink.push(root, root, 0)?;
        }
    }

    Ok(Closure { pairs: sink.pairs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn triples(edges: &[(i64, i64)], root_id_zero: bool) -> BTreeSet<(i64, i64, u32)> {
        let mut g = ClosureGraph::new();
        for &(p, c) in edges {
            g.insert_edge(p, c).unwrap();
        }
        let policy = ClosurePolicy {
            root_id_zero,
            max_pairs: None,
        };
        compute_closure(&g, &policy)
            .unwrap()
            .pairs(&g)
            .map(|p| (*p.ancestor, *p.descendant, p.distance))
            .collect()
    }

    #[test]
    fn chain_with_root_row() {
        let got = triples(&[(1, 2), (2, 3)], true);
        let want: BTreeSet<_> = [(1, 2, 1), (2, 3, 1), (1, 3, 2), (1, 1, 0)].into();
        assert_eq!(got, want);
    }

    #[test]
    fn shortest_path_wins_over_longer_one() {
        // 1→2→3→4 and a shortcut 1→4
        let got = triples(&[(1, 2), (2, 3), (3, 4), (1, 4)], false);
        assert!(got.contains(&(1, 4, 1)));
        assert!(!got.iter().any(|&(a, d, dist)| a == 1 && d == 4 && dist != 1));
    }

    #[test]
    fn self_loop_is_a_direct_edge() {
        let got = triples(&[(5, 5), (5, 6)], true);
        let want: BTreeSet<_> = [(5, 5, 1), (5, 6, 1)].into();
        assert_eq!(got, want, "5 has an incoming edge, so no root row");
    }

    #[test]
    fn pair_limit_is_enforced() {
        let mut g = ClosureGraph::new();
        for (p, c) in [(1, 2), (2, 3), (3, 4)] {
            g.insert_edge(p, c).unwrap();
        }
        let policy = ClosurePolicy {
            root_id_zero: false,
            max_pairs: Some(5),
        };
        assert_eq!(
            compute_closure(&g, &policy),
            Err(ResourceError::PairLimit { limit: 5 })
        );
    }

    #[test]
    fn empty_graph_has_empty_closure() {
        let g: ClosureGraph<i64> = ClosureGraph::new();
        let closure = compute_closure(
            &g,
            &ClosurePolicy {
                root_id_zero: true,
                max_pairs: None,
            },
        )
        .unwrap();
        assert!(closure.is_empty());
    }
}
