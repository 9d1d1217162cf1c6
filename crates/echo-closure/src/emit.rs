// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Streams a computed closure back out as typed rows.

use crate::closure::{Closure, ClosurePair};
use crate::graph::ClosureGraph;
use crate::layout::Row;
use crate::value::Value;

/// Cursor over a closure, producing one output row per pair.
///
/// Rows follow the negotiated layout `[parent, child, distance]`. Id values are
/// cloned from the graph exactly as they arrived; the distance is always a
/// [`Value::Integer`].
#[derive(Debug)]
pub struct ResultEmitter {
    graph: ClosureGraph<Value>,
    closure: Closure,
    cursor: usize,
}

impl ResultEmitter {
    /// Takes ownership of the graph and the closure computed from it.
    pub fn new(graph: ClosureGraph<Value>, closure: Closure) -> Self {
        Self {
            graph,
            closure,
            cursor: 0,
        }
    }

    /// Next pair, or `None` once every pair has been handed out.
    pub fn next_pair(&mut self) -> Option<ClosurePair<&Value>> {
        let pair = self.closure.get(self.cursor)?;
        self.cursor += 1;
        Some(ClosurePair {
            ancestor: self.graph.node(pair.ancestor),
            descendant: self.graph.node(pair.descendant),
            distance: pair.distance,
        })
    }

    /// Next output row, or `None` once every pair has been emitted.
    pub fn next_result_row(&mut self) -> Option<Row> {
        self.next_pair().map(|pair| {
            vec![
                pair.ancestor.clone(),
                pair.descendant.clone(),
                Value::Integer(i64::from(pair.distance)),
            ]
        })
    }

    /// Pairs not yet emitted.
    pub fn remaining(&self) -> usize {
        self.closure.len().saturating_sub(self.cursor)
    }

    /// Pairs already emitted.
    pub fn emitted(&self) -> usize {
        self.cursor.min(self.closure.len())
    }

    /// Total pairs in the closure.
    pub fn total(&self) -> usize {
        self.closure.len()
    }
}

impl Iterator for ResultEmitter {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.next_result_row()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}
