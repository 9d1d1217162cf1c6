// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Echo closure crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory settings store fake for testing without filesystem
//! - [`rows`] - Layout and edge-row builders
//! - [`closure`] - Synchronous transform driver and a brute-force closure oracle

pub mod closure;
pub mod config;
pub mod rows;

// Re-export commonly used items at crate root for convenience
pub use closure::{int_triple_set, int_triples, reference_closure, run_transform};
pub use config::InMemoryConfigStore;
pub use rows::{edge_layout, int_edge_rows, str_edge_rows, LayoutBuilder};
