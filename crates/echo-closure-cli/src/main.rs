// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `closure-gen`: compute closure tables from JSON-lines edge files.
//!
//! Rows are read from a file (or stdin), pushed through a [`ClosureStage`]
//! on bounded queues, and written to stdout as JSON lines or a table. Logs go
//! to stderr; set `RUST_LOG` to adjust verbosity. Ctrl+C stops the stage.

mod cli;
mod input;
mod output;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use echo_closure::{check, Row, RowLayout};
use echo_closure_stage::{ClosureStage, StageOutcome};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, Cli, Command, Format, RunArgs};
use crate::input::read_rows;
use crate::output::{render_table, JsonLinesWriter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Check(args) => run_check(&args),
    }
}

/// Where result rows go as they arrive.
enum Sink {
    Lines(JsonLinesWriter<io::StdoutLock<'static>>),
    Table(RowLayout, Vec<Row>),
}

impl Sink {
    fn new(format: Format, layout: &RowLayout) -> Self {
        match format {
            Format::Jsonl => Self::Lines(JsonLinesWriter::new(io::stdout().lock(), layout)),
            Format::Table => Self::Table(layout.clone(), Vec::new()),
        }
    }

    fn push(&mut self, row: Row) -> Result<()> {
        match self {
            Self::Lines(writer) => writer.write_row(&row).context("write result row")?,
            Self::Table(_, rows) => rows.push(row),
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Self::Lines(mut writer) => writer.flush()?,
            Self::Table(layout, rows) => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", render_table(&layout, &rows))?;
            }
        }
        Ok(())
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let settings = args.fields.resolve()?;
    let file = read_rows(&args.input)?;
    info!(
        rows = file.rows.len(),
        fields = file.layout.len(),
        "input loaded"
    );

    let stage = ClosureStage::new(settings.clone(), &file.layout)?;
    if let Some(profile) = &args.save_profile {
        args.fields
            .service()?
            .save(profile, &settings)
            .with_context(|| format!("save profile `{profile}`"))?;
        info!(profile = %profile, "settings saved");
    }

    let capacity = args.channel_capacity.max(1);
    let (in_tx, in_rx) = mpsc::channel::<Row>(capacity);
    let (out_tx, mut out_rx) = mpsc::channel::<Row>(capacity);
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut sink = Sink::new(args.format, stage.output_layout());
    let stage = tokio::spawn(stage.run(in_rx, out_tx, stop_rx));
    let producer = tokio::spawn(async move {
        for row in file.rows {
            if in_tx.send(row).await.is_err() {
                break;
            }
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    loop {
        tokio::select! {
            row = out_rx.recv() => match row {
                Some(row) => sink.push(row)?,
                None => break,
            },
            signal = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                match signal {
                    Ok(()) => {
                        warn!("interrupt received, stopping");
                        let _ = stop_tx.send(true);
                    }
                    Err(err) => warn!(error = %err, "ctrl-c handler unavailable"),
                }
            }
        }
    }

    let joined = stage.await;
    producer.abort();
    sink.finish()?;
    let report = joined.context("closure stage panicked")??;

    match report.outcome {
        StageOutcome::Completed => {
            info!(
                rows_read = report.stats.rows_read,
                rows_skipped = report.stats.rows_skipped,
                nodes = report.stats.nodes,
                rows_emitted = report.stats.rows_emitted,
                "closure generated"
            );
            Ok(())
        }
        StageOutcome::Cancelled => bail!(
            "cancelled after emitting {} of {} rows",
            report.stats.rows_emitted,
            report.stats.pairs_computed
        ),
    }
}

fn run_check(args: &CheckArgs) -> Result<()> {
    let settings = args.fields.resolve()?;
    let file = read_rows(&args.input)?;
    let remarks = check(&settings, &file.layout);

    let mut out = io::stdout().lock();
    for remark in &remarks {
        let tag = if remark.is_error() { "error" } else { "ok" };
        writeln!(out, "{tag}: {}", remark.message)?;
    }
    let errors = remarks.iter().filter(|r| r.is_error()).count();
    if errors > 0 {
        bail!("{errors} check(s) failed");
    }
    Ok(())
}
