//! Descending identifier sweep

use super::Harvester;
use crate::types::{Event, IdOutcome, SweepOutcome, SweepReport, SweepState};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl Harvester {
    /// Sweep the configured anchor and window
    pub async fn run(&self, cancel: &CancellationToken) -> SweepReport {
        let sweep = &self.config.sweep;
        self.sweep(sweep.anchor_id, sweep.window, cancel).await
    }

    /// Visit `anchor, anchor - 1, ..., anchor - window` in order
    ///
    /// The range stops at zero. Between identifiers the harvester waits for the
    /// configured delay, and a cancelled token ends the sweep before the next
    /// identifier starts. The identifier in flight always finishes.
    pub async fn sweep(&self, anchor: u64, window: u64, cancel: &CancellationToken) -> SweepReport {
        let end = anchor.saturating_sub(window);
        let threshold = self.config.sweep.max_misses_in_a_row;
        let delay = self.config.sweep.request_delay;

        self.set_state(SweepState::Sweeping);
        self.emit_event(Event::SweepStarted { anchor, end });
        info!(anchor, end, count = (anchor - end).saturating_add(1), "sweep started");

        let mut report = SweepReport::new();
        let mut misses_in_a_row: u32 = 0;
        let mut ids = (end..=anchor).rev().peekable();

        report.outcome = loop {
            let Some(n) = ids.next() else {
                break SweepOutcome::Completed;
            };
            if cancel.is_cancelled() {
                break SweepOutcome::AbortedByInterrupt;
            }

            let raw = n.to_string();
            match self.process_id(&raw).await {
                IdOutcome::StorageFull => break SweepOutcome::AbortedByStorageFull,
                IdOutcome::Productive(record) => {
                    misses_in_a_row = 0;
                    report.productive += 1;
                    report.captures += u64::from(record.artifact.is_some());
                    report.tables += u64::from(record.table.is_some());
                    report.pruned_bytes += record.pruned_bytes;
                }
                IdOutcome::Miss(_) => {
                    misses_in_a_row += 1;
                    report.misses += 1;
                }
                IdOutcome::Fault(_) => report.faults += 1,
            }
            report.processed += 1;
            report.last_id = Some(raw);

            if misses_in_a_row >= threshold {
                warn!(misses_in_a_row, "too many consecutive misses, aborting");
                break SweepOutcome::AbortedByMissStreak;
            }
            if ids.peek().is_none() {
                break SweepOutcome::Completed;
            }

            tokio::select! {
                _ = cancel.cancelled() => break SweepOutcome::AbortedByInterrupt,
                _ = tokio::time::sleep(delay) => {}
            }
        };

        info!(
            outcome = %report.outcome,
            processed = report.processed,
            productive = report.productive,
            captures = report.captures,
            tables = report.tables,
            "sweep finished"
        );
        self.set_state(SweepState::Finished(report.outcome));
        self.emit_event(Event::SweepFinished {
            report: report.clone(),
        });
        report
    }
}
