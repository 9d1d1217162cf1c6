// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Echo Closure Stage
//!
//! Runs a [`ClosureTransform`] as one stage of a concurrently executing
//! pipeline: rows arrive on a bounded input queue, results leave on a bounded
//! output queue, and a pipeline-wide stop signal can interrupt either wait.
//!
//! ```rust,ignore
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let stage = ClosureStage::new(settings, &upstream)?;
//! let handle = tokio::spawn(stage.run(input_rx, output_tx, shutdown_rx));
//!
//! // ... later ...
//! shutdown_tx.send(true)?;
//! let report = handle.await??;
//! ```
#![forbid(unsafe_code)]

use echo_closure::{
    ClosureError, ClosureSettings, ClosureTransform, Row, RowLayout, TransformStats,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

const PROGRESS_EVERY: u64 = 1_000_000;

/// How a stage run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Every result row was delivered downstream.
    Completed,
    /// The stop signal was raised; no further rows were emitted.
    Cancelled,
}

/// Summary of a stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// How the run ended.
    pub outcome: StageOutcome,
    /// Transform counters at the end of the run.
    pub stats: TransformStats,
}

/// Fatal stage failures, reported to the pipeline controller.
#[derive(Debug, Error)]
pub enum StageError {
    /// The transform rejected its input or hit a resource bound.
    #[error(transparent)]
    Transform(#[from] ClosureError),
    /// The downstream consumer went away before all rows were delivered.
    #[error("downstream closed after {emitted} rows")]
    DownstreamClosed {
        /// Rows delivered before the channel closed.
        emitted: u64,
    },
}

/// A closure transform bound to the pipeline's queues.
#[derive(Debug)]
pub struct ClosureStage {
    transform: ClosureTransform,
}

impl ClosureStage {
    /// Negotiates the output schema; fails before any row is read.
    pub fn new(settings: ClosureSettings, upstream: &RowLayout) -> Result<Self, ClosureError> {
        Ok(Self {
            transform: ClosureTransform::new(settings, upstream)?,
        })
    }

    /// Layout of the rows this stage will emit.
    pub fn output_layout(&self) -> &RowLayout {
        self.transform.output_layout()
    }

    /// Consumes `input` until it closes, computes the closure, then emits.
    ///
    /// Waiting on either queue has no timeout. Raising `shutdown` ends the run
    /// promptly with [`StageOutcome::Cancelled`] and releases the graph. The
    /// closure computation itself runs inline without yielding.
    ///
    /// Dropping the `watch::Sender` behind `shutdown` is treated as a stop
    /// request: the stage cancels as soon as it next waits. Keep the sender
    /// alive for as long as the stage should run.
    #[instrument(skip_all, fields(transform = %self.transform.settings().transform_name))]
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<Row>,
        output: mpsc::Sender<Row>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<StageReport, StageError> {
        loop {
            let row = tokio::select! {
                biased;
                () = stop_requested(&mut shutdown) => return Ok(self.cancelled()),
                row = input.recv() => row,
            };
            let Some(row) = row else {
                break;
            };
            self.transform.process_row(row)?;
            let read = self.transform.stats().rows_read;
            if read.is_multiple_of(PROGRESS_EVERY) {
                debug!(rows_read = read, "accumulating");
            }
        }
        // Stop reading; upstream sees a closed channel if it keeps producing.
        input.close();

        self.transform.finish_input()?;

        // A row is only taken from the transform once it has a slot, so
        // `rows_emitted` always equals the rows delivered downstream.
        while self.transform.remaining_rows() > 0 {
            let permit = tokio::select! {
                biased;
                () = stop_requested(&mut shutdown) => return Ok(self.cancelled()),
                permit = output.reserve() => permit,
            };
            let Ok(permit) = permit else {
                let emitted = self.transform.stats().rows_emitted;
                self.transform.cancel();
                return Err(StageError::DownstreamClosed { emitted });
            };
            if let Some(row) = self.transform.next_result_row()? {
                permit.send(row);
            }
        }
        // Exhausted; this moves the transform to `Done`.
        self.transform.next_result_row()?;

        let stats = *self.transform.stats();
        info!(
            rows_read = stats.rows_read,
            rows_skipped = stats.rows_skipped,
            rows_emitted = stats.rows_emitted,
            "closure stage completed"
        );
        Ok(StageReport {
            outcome: StageOutcome::Completed,
            stats,
        })
    }

    fn cancelled(mut self) -> StageReport {
        self.transform.cancel();
        let stats = *self.transform.stats();
        info!(
            rows_read = stats.rows_read,
            rows_emitted = stats.rows_emitted,
            "closure stage cancelled"
        );
        StageReport {
            outcome: StageOutcome::Cancelled,
            stats,
        }
    }
}

/// Resolves once the stop flag is `true` or its sender has been dropped.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
