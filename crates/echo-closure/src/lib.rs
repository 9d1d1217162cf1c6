// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! echo-closure: closure-table generator for row pipelines.
//!
//! Turns a stream of direct `parent → child` rows into the full transitive
//! closure `(ancestor, descendant, distance)`, keeping the minimum distance for
//! every reachable pair. Inputs may be unsorted, unrooted and cyclic.
//!
//! The functional contract is deliberately plain so any host can adapt it:
//! [`negotiate_schema`], [`ClosureGraph::insert_edge`], [`compute_closure`]
//! and [`ResultEmitter::next_result_row`]. [`ClosureTransform`] wires them into
//! the accumulate → compute → emit lifecycle.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod closure;
mod emit;
mod error;
mod graph;
mod layout;
mod schema;
mod settings;
mod transform;
mod value;

/// Closure computation over an accumulated graph.
pub use closure::{compute_closure, Closure, ClosurePair, ClosurePolicy};
/// Row emission from a computed closure.
pub use emit::ResultEmitter;
/// Error kinds.
pub use error::{ClosureError, MalformedReason, ResourceError};
/// Edge accumulation.
pub use graph::{ClosureGraph, EdgeInsert, NodeIndex};
/// Row layouts and field metadata.
pub use layout::{Row, RowLayout, ValueMeta};
/// Output schema negotiation and design-time checks.
pub use schema::{
    check, negotiate_schema, CheckRemark, OutputSchema, RemarkLevel, DEFAULT_INTEGER_LENGTH,
};
/// Transform settings.
pub use settings::{
    ClosureSettings, MalformedRowPolicy, DEFAULT_CHILD_ID_FIELD, DEFAULT_DISTANCE_FIELD,
    DEFAULT_PARENT_ID_FIELD, DEFAULT_TRANSFORM_NAME,
};
/// Lifecycle driver.
pub use transform::{ClosureTransform, RowOutcome, TransformState, TransformStats};
/// Field values.
pub use value::{Value, ValueType};
