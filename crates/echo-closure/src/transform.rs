// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The closure transform lifecycle.
//!
//! ```text
//! INIT ─► ACCUMULATING ─► COMPUTING ─► EMITTING ─► DONE
//!   │          │               │
//!   └──────────┴───────────────┴─► ERROR
//! ```
//!
//! Closure needs the whole graph, so the transform buffers every edge before
//! computing anything. `INIT` is left as soon as the output schema has been
//! negotiated; a negotiation failure is returned from
//! [`ClosureTransform::new`] and no transform exists.

use tracing::{debug, info, warn};

use crate::closure::{compute_closure, ClosurePolicy};
use crate::emit::ResultEmitter;
use crate::error::{ClosureError, MalformedReason};
use crate::graph::{ClosureGraph, EdgeInsert};
use crate::layout::{Row, RowLayout};
use crate::schema::{negotiate_schema, OutputSchema};
use crate::settings::{ClosureSettings, MalformedRowPolicy};
use crate::value::{Value, ValueType};

/// Lifecycle state of a [`ClosureTransform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    /// Negotiating the output schema.
    Init,
    /// Reading edges from the input stream.
    Accumulating,
    /// Computing the closure.
    Computing,
    /// Handing out result rows.
    Emitting,
    /// Every result row has been emitted.
    Done,
    /// A fatal error stopped the transform.
    Error,
    /// Stopped by the pipeline before completion.
    Cancelled,
}

/// What happened to one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// A new edge was stored.
    Inserted,
    /// The edge was already known.
    Duplicate,
    /// The row was dropped under [`MalformedRowPolicy::Skip`].
    Skipped(MalformedReason),
}

/// Counters for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformStats {
    /// Rows received.
    pub rows_read: u64,
    /// Distinct edges stored.
    pub edges_inserted: u64,
    /// Rows repeating an already stored edge.
    pub duplicate_edges: u64,
    /// Malformed rows dropped.
    pub rows_skipped: u64,
    /// Distinct nodes in the graph.
    pub nodes: u64,
    /// Closure pairs computed.
    pub pairs_computed: u64,
    /// Result rows handed out.
    pub rows_emitted: u64,
}

/// One execution of the closure-table generator.
#[derive(Debug)]
pub struct ClosureTransform {
    settings: ClosureSettings,
    schema: OutputSchema,
    state: TransformState,
    graph: Option<ClosureGraph<Value>>,
    emitter: Option<ResultEmitter>,
    stats: TransformStats,
}

impl ClosureTransform {
    /// Negotiates the output schema against `upstream` and starts accumulating.
    ///
    /// # Errors
    ///
    /// [`ClosureError::Configuration`] if the settings do not resolve.
    pub fn new(settings: ClosureSettings, upstream: &RowLayout) -> Result<Self, ClosureError> {
        let schema = negotiate_schema(&settings, upstream)?;
        let graph = match settings.max_edges {
            Some(limit) => ClosureGraph::with_max_edges(limit),
            None => ClosureGraph::new(),
        };
        debug!(
            transform = %settings.transform_name,
            parent = %settings.parent_id_field,
            child = %settings.child_id_field,
            "closure transform accumulating"
        );
        Ok(Self {
            settings,
            schema,
            state: TransformState::Accumulating,
            graph: Some(graph),
            emitter: None,
            stats: TransformStats::default(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Negotiated output layout.
    pub fn output_layout(&self) -> &RowLayout {
        self.schema.layout()
    }

    /// Negotiated schema, including upstream id column positions.
    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    /// Settings this transform was built from.
    pub fn settings(&self) -> &ClosureSettings {
        &self.settings
    }

    /// Counters so far.
    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    /// Result rows not yet handed out; `0` outside `Emitting`.
    pub fn remaining_rows(&self) -> usize {
        self.emitter.as_ref().map_or(0, ResultEmitter::remaining)
    }

    fn expect_state(&self, expected: TransformState) -> Result<(), ClosureError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ClosureError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn fail(&mut self, err: ClosureError) -> ClosureError {
        self.state = TransformState::Error;
        self.graph = None;
        self.emitter = None;
        err
    }

    /// Reads one upstream row as an edge.
    ///
    /// # Errors
    ///
    /// [`ClosureError::MalformedRow`] under [`MalformedRowPolicy::Abort`],
    /// [`ClosureError::Resource`] when a limit is hit, or
    /// [`ClosureError::InvalidState`] outside `Accumulating`. Any of these
    /// moves the transform to `Error`, except `InvalidState`.
    pub fn process_row(&mut self, mut row: Row) -> Result<RowOutcome, ClosureError> {
        self.expect_state(TransformState::Accumulating)?;
        let ordinal = self.stats.rows_read;
        self.stats.rows_read += 1;

        let ids = take_id(
            &mut row,
            self.schema.parent_index(),
            self.schema.parent_field(),
            self.schema.parent_type(),
        )
        .and_then(|parent| {
            take_id(
                &mut row,
                self.schema.child_index(),
                self.schema.child_field(),
                self.schema.child_type(),
            )
            .map(|child| (parent, child))
        });

        let (parent, child) = match ids {
            Ok(ids) => ids,
            Err(reason) => {
                return match self.settings.malformed_rows {
                    MalformedRowPolicy::Skip => {
                        warn!(row = ordinal, %reason, "skipping malformed row");
                        self.stats.rows_skipped += 1;
                        Ok(RowOutcome::Skipped(reason))
                    }
                    MalformedRowPolicy::Abort => Err(self.fail(ClosureError::MalformedRow {
                        row: ordinal,
                        reason,
                    })),
                };
            }
        };

        let Some(graph) = self.graph.as_mut() else {
            return Err(self.fail(ClosureError::InvalidState {
                expected: TransformState::Accumulating,
                actual: TransformState::Error,
            }));
        };
        match graph.insert_edge(parent, child) {
            Ok(EdgeInsert::Inserted) => {
                self.stats.edges_inserted += 1;
                Ok(RowOutcome::Inserted)
            }
            Ok(EdgeInsert::Duplicate) => {
                self.stats.duplicate_edges += 1;
                Ok(RowOutcome::Duplicate)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Signals end of input, computes the closure and starts emitting.
    ///
    /// # Errors
    ///
    /// [`ClosureError::Resource`] when the pair limit is hit, or
    /// [`ClosureError::InvalidState`] outside `Accumulating`.
    pub fn finish_input(&mut self) -> Result<&TransformStats, ClosureError> {
        self.expect_state(TransformState::Accumulating)?;
        self.state = TransformState::Computing;
        let Some(graph) = self.graph.take() else {
            return Err(self.fail(ClosureError::InvalidState {
                expected: TransformState::Computing,
                actual: TransformState::Error,
            }));
        };
        self.stats.nodes = graph.node_count() as u64;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "computing closure"
        );

        let policy = ClosurePolicy {
            root_id_zero: self.settings.root_id_zero,
            max_pairs: self.settings.max_pairs,
        };
        let closure = match compute_closure(&graph, &policy) {
            Ok(closure) => closure,
            Err(err) => return Err(self.fail(err.into())),
        };
        self.stats.pairs_computed = closure.len() as u64;
        self.emitter = Some(ResultEmitter::new(graph, closure));
        self.state = TransformState::Emitting;
        debug!(pairs = self.stats.pairs_computed, "closure computed");
        Ok(&self.stats)
    }

    /// Next output row; `None` once the closure is exhausted.
    ///
    /// # Errors
    ///
    /// [`ClosureError::InvalidState`] unless `Emitting` or `Done`.
    pub fn next_result_row(&mut self) -> Result<Option<Row>, ClosureError> {
        if self.state == TransformState::Done {
            return Ok(None);
        }
        self.expect_state(TransformState::Emitting)?;
        match self.emitter.as_mut().and_then(ResultEmitter::next_result_row) {
            Some(row) => {
                self.stats.rows_emitted += 1;
                Ok(Some(row))
            }
            None => {
                self.emitter = None;
                self.state = TransformState::Done;
                info!(
                    transform = %self.settings.transform_name,
                    rows_read = self.stats.rows_read,
                    edges = self.stats.edges_inserted,
                    skipped = self.stats.rows_skipped,
                    rows_emitted = self.stats.rows_emitted,
                    "closure transform finished"
                );
                Ok(None)
            }
        }
    }

    /// Stops the transform and releases the graph and closure.
    ///
    /// A finished or failed transform keeps its terminal state.
    pub fn cancel(&mut self) {
        self.graph = None;
        self.emitter = None;
        if !matches!(self.state, TransformState::Done | TransformState::Error) {
            debug!(state = ?self.state, "closure transform cancelled");
            self.state = TransformState::Cancelled;
        }
    }
}

fn take_id(
    row: &mut Row,
    index: usize,
    field: &str,
    declared: ValueType,
) -> Result<Value, MalformedReason> {
    let Some(slot) = row.get_mut(index) else {
        return Err(MalformedReason::MissingColumn {
            field: field.to_owned(),
            index,
        });
    };
    match slot.value_type() {
        None => Err(MalformedReason::NullId {
            field: field.to_owned(),
        }),
        Some(found) if found != declared => Err(MalformedReason::TypeMismatch {
            field: field.to_owned(),
            expected: declared,
            found,
        }),
        Some(_) => Ok(std::mem::replace(slot, Value::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ValueMeta;

    fn layout() -> RowLayout {
        [
            ValueMeta::new("parent", ValueType::Integer),
            ValueMeta::new("child", ValueType::Integer),
        ]
        .into_iter()
        .collect()
    }

    fn settings() -> ClosureSettings {
        ClosureSettings::new("parent", "child", "distance")
    }

    fn row(p: i64, c: i64) -> Row {
        vec![Value::Integer(p), Value::Integer(c)]
    }

    #[test]
    fn walks_the_full_lifecycle() {
        let mut t = ClosureTransform::new(settings().with_root_id_zero(true), &layout()).unwrap();
        assert_eq!(t.state(), TransformState::Accumulating);
        assert_eq!(t.process_row(row(1, 2)).unwrap(), RowOutcome::Inserted);
        assert_eq!(t.process_row(row(1, 2)).unwrap(), RowOutcome::Duplicate);
        t.finish_input().unwrap();
        assert_eq!(t.state(), TransformState::Emitting);

        let mut rows = Vec::new();
        while let Some(r) = t.next_result_row().unwrap() {
            rows.push(r);
        }
        assert_eq!(t.state(), TransformState::Done);
        assert_eq!(rows.len(), 2);
        assert_eq!(t.stats().rows_emitted, 2);
        assert_eq!(t.stats().duplicate_edges, 1);
        assert_eq!(t.next_result_row().unwrap(), None);
    }

    #[test]
    fn self_loop_alone_is_still_emitted() {
        let mut t = ClosureTransform::new(settings(), &layout()).unwrap();
        t.process_row(row(7, 7)).unwrap();
        t.finish_input().unwrap();
        assert_eq!(
            t.next_result_row().unwrap(),
            Some(vec![Value::Integer(7), Value::Integer(7), Value::Integer(1)])
        );
    }

    #[test]
    fn null_id_is_skipped_by_default() {
        let mut t = ClosureTransform::new(settings(), &layout()).unwrap();
        let outcome = t.process_row(vec![Value::Null, Value::Integer(2)]).unwrap();
        assert!(matches!(outcome, RowOutcome::Skipped(MalformedReason::NullId { .. })));
        assert_eq!(t.stats().rows_skipped, 1);
        assert_eq!(t.state(), TransformState::Accumulating);
    }

    #[test]
    fn abort_policy_moves_to_error() {
        let mut t = ClosureTransform::new(
            settings().with_malformed_rows(MalformedRowPolicy::Abort),
            &layout(),
        )
        .unwrap();
        t.process_row(row(1, 2)).unwrap();
        let err = t.process_row(vec![Value::Integer(1)]).unwrap_err();
        assert!(matches!(
            err,
            ClosureError::MalformedRow {
                row: 1,
                reason: MalformedReason::MissingColumn { index: 1, .. }
            }
        ));
        assert_eq!(t.state(), TransformState::Error);
        assert!(matches!(
            t.finish_input(),
            Err(ClosureError::InvalidState { .. })
        ));
    }

    #[test]
    fn mistyped_id_is_malformed() {
        let mut t = ClosureTransform::new(settings(), &layout()).unwrap();
        let outcome = t
            .process_row(vec![Value::from("1"), Value::Integer(2)])
            .unwrap();
        assert!(matches!(
            outcome,
            RowOutcome::Skipped(MalformedReason::TypeMismatch {
                expected: ValueType::Integer,
                found: ValueType::String,
                ..
            })
        ));
    }

    #[test]
    fn edge_limit_is_fatal() {
        let mut t = ClosureTransform::new(settings().with_max_edges(1), &layout()).unwrap();
        t.process_row(row(1, 2)).unwrap();
        let err = t.process_row(row(2, 3)).unwrap_err();
        assert!(matches!(err, ClosureError::Resource(_)));
        assert_eq!(t.state(), TransformState::Error);
    }

    #[test]
    fn rows_before_finish_are_rejected_in_emitting() {
        let mut t = ClosureTransform::new(settings(), &layout()).unwrap();
        assert!(matches!(
            t.next_result_row(),
            Err(ClosureError::InvalidState {
                expected: TransformState::Emitting,
                actual: TransformState::Accumulating
            })
        ));
        t.finish_input().unwrap();
        assert!(t.process_row(row(1, 2)).is_err());
    }

    #[test]
    fn remaining_rows_counts_down_to_zero() {
        let mut t = ClosureTransform::new(settings(), &layout()).unwrap();
        t.process_row(row(1, 2)).unwrap();
        t.process_row(row(2, 3)).unwrap();
        assert_eq!(t.remaining_rows(), 0);
        t.finish_input().unwrap();
        assert_eq!(t.remaining_rows(), 3);
        t.next_result_row().unwrap();
        assert_eq!(t.remaining_rows(), 2);
        assert_eq!(t.stats().rows_emitted, 1);
    }

    #[test]
    fn cancel_releases_and_blocks_further_work() {
        let mut t = ClosureTransform::new(settings(), &layout()).unwrap();
        t.process_row(row(1, 2)).unwrap();
        t.cancel();
        assert_eq!(t.state(), TransformState::Cancelled);
        assert!(t.finish_input().is_err());
    }
}
