// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface and settings resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use echo_closure::{ClosureSettings, MalformedRowPolicy};
use echo_closure_config::{FsConfigStore, SettingsService};

#[derive(Parser)]
#[command(
    name = "closure-gen",
    version,
    about = "Generate closure tables from parent/child row streams",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the closure of a JSON-lines edge file.
    Run(RunArgs),
    /// Check that the configured id fields exist in the input.
    Check(CheckArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// JSON-lines input, one object per row (`-` for stdin).
    #[arg(long, short)]
    pub input: PathBuf,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Persist the effective settings under this profile name.
    #[arg(long)]
    pub save_profile: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Jsonl)]
    pub format: Format,

    /// Capacity of the input and output row queues.
    #[arg(long, default_value_t = 1024)]
    pub channel_capacity: usize,
}

#[derive(Args)]
pub struct CheckArgs {
    /// JSON-lines input, one object per row (`-` for stdin).
    #[arg(long, short)]
    pub input: PathBuf,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Args)]
pub struct FieldArgs {
    /// Field holding the parent id.
    #[arg(long)]
    pub parent_field: Option<String>,

    /// Field holding the child id.
    #[arg(long)]
    pub child_field: Option<String>,

    /// Name of the generated distance field.
    #[arg(long)]
    pub distance_field: Option<String>,

    /// Emit a zero-distance self row for every root.
    #[arg(long, conflicts_with = "no_root_id_zero")]
    pub root_id_zero: bool,

    /// Never emit root self rows, even if the profile enables them.
    #[arg(long)]
    pub no_root_id_zero: bool,

    /// What to do with rows whose ids are null or mistyped.
    #[arg(long, value_enum)]
    pub on_malformed: Option<OnMalformed>,

    /// Fail once more than this many distinct edges are buffered.
    #[arg(long)]
    pub max_edges: Option<u64>,

    /// Fail once the closure exceeds this many pairs.
    #[arg(long)]
    pub max_pairs: Option<u64>,

    /// Start from settings in this JSON file.
    #[arg(long, conflicts_with = "profile")]
    pub settings: Option<PathBuf>,

    /// Start from a saved settings profile.
    #[arg(long)]
    pub profile: Option<String>,

    /// Directory holding profiles (defaults to the platform config dir).
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    /// One JSON object per line.
    Jsonl,
    /// Human-readable table.
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OnMalformed {
    /// Drop the row and log a warning.
    Skip,
    /// Fail the run.
    Abort,
}

impl From<OnMalformed> for MalformedRowPolicy {
    fn from(value: OnMalformed) -> Self {
        match value {
            OnMalformed::Skip => Self::Skip,
            OnMalformed::Abort => Self::Abort,
        }
    }
}

impl FieldArgs {
    pub fn service(&self) -> Result<SettingsService<FsConfigStore>> {
        let store = match &self.config_dir {
            Some(dir) => FsConfigStore::at(dir),
            None => FsConfigStore::new(),
        }
        .context("open settings store")?;
        Ok(SettingsService::new(store))
    }

    /// Base settings (file, profile or defaults) with flags applied on top.
    pub fn resolve(&self) -> Result<ClosureSettings> {
        let mut settings = if let Some(path) = &self.settings {
            load_settings_file(path)?
        } else if let Some(profile) = &self.profile {
            self.service()?
                .load_validated(profile)
                .with_context(|| format!("load profile `{profile}`"))?
                .with_context(|| format!("profile `{profile}` not found"))?
        } else {
            ClosureSettings::default()
        };

        if let Some(name) = &self.parent_field {
            settings.parent_id_field.clone_from(name);
        }
        if let Some(name) = &self.child_field {
            settings.child_id_field.clone_from(name);
        }
        if let Some(name) = &self.distance_field {
            settings.distance_field.clone_from(name);
        }
        if self.root_id_zero {
            settings.root_id_zero = true;
        }
        if self.no_root_id_zero {
            settings.root_id_zero = false;
        }
        if let Some(policy) = self.on_malformed {
            settings.malformed_rows = policy.into();
        }
        if self.max_edges.is_some() {
            settings.max_edges = self.max_edges;
        }
        if self.max_pairs.is_some() {
            settings.max_pairs = self.max_pairs;
        }
        Ok(settings)
    }
}

fn load_settings_file(path: &Path) -> Result<ClosureSettings> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let settings: ClosureSettings = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse settings {}", path.display()))?;
    echo_closure_config::validate(&settings)?;
    Ok(settings)
}
