// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for the closure transform.

use thiserror::Error;

use crate::transform::TransformState;
use crate::value::ValueType;

/// Memory-bound failures while accumulating or computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The configured edge limit was reached.
    #[error("edge limit of {limit} exceeded")]
    EdgeLimit {
        /// Configured maximum number of distinct edges.
        limit: u64,
    },
    /// The configured closure pair limit was reached.
    #[error("closure pair limit of {limit} exceeded")]
    PairLimit {
        /// Configured maximum number of closure pairs.
        limit: u64,
    },
    /// More distinct nodes than the node index can address.
    #[error("node index space exhausted")]
    NodeIndexOverflow,
}

/// Why a row could not be read as an edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// The id field holds a null value.
    #[error("field `{field}` is null")]
    NullId {
        /// Field name.
        field: String,
    },
    /// The row is shorter than the layout.
    #[error("field `{field}` missing at column {index}")]
    MissingColumn {
        /// Field name.
        field: String,
        /// Expected column index.
        index: usize,
    },
    /// The value does not match the declared field type.
    #[error("field `{field}` declared {expected} but holds {found}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Declared type.
        expected: ValueType,
        /// Type of the value found.
        found: ValueType,
    },
}

/// Errors surfaced by the closure transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClosureError {
    /// Settings do not resolve against the upstream layout.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A row could not be read as an edge and the policy is `Abort`.
    #[error("malformed row {row}: {reason}")]
    MalformedRow {
        /// Zero-based ordinal of the row in the input stream.
        row: u64,
        /// What was wrong with it.
        reason: MalformedReason,
    },
    /// Accumulation or computation exceeded a resource bound.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// An operation was called in the wrong lifecycle state.
    #[error("invalid transform state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        /// State the operation requires.
        expected: TransformState,
        /// Current state.
        actual: TransformState,
    },
}
