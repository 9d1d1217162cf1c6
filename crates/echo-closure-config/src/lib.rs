// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings persistence for closure transforms.
//!
//! The transform itself only reads a resolved [`echo_closure::ClosureSettings`]
//! at execution start. This crate loads and saves those settings as named JSON
//! profiles behind the [`ConfigStore`] port.
#![forbid(unsafe_code)]

pub mod config;
pub mod fs;

pub use config::{validate, ConfigError, ConfigStore, SettingsService};
pub use fs::FsConfigStore;
