//! Driver loop: source → extraction → accumulation → finalize.

use std::time::Instant;

use dr_core::Result;
use dr_event::EventSource;
use serde::{Deserialize, Serialize};

use crate::accumulators::{AccumulatorSet, AnalysisRanges, FinalizedAccumulators, LeakTally};
use crate::config::RunConfig;
use crate::extract::ObservableExtractor;

/// Bookkeeping for a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Events read and accumulated.
    pub events: u64,
    /// Events the source reported at open.
    pub entries: usize,
    /// Leak entries per class.
    pub leak_tally: LeakTally,
    /// Wall-clock time of the event loop (seconds).
    pub elapsed_secs: f64,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Run bookkeeping.
    pub summary: RunSummary,
    /// Finalized accumulators.
    pub histograms: FinalizedAccumulators,
}

/// Closes the source when dropped unless [`close`](Self::close) ran first.
struct SourceGuard<'a> {
    source: &'a mut dyn EventSource,
    closed: bool,
}

impl<'a> SourceGuard<'a> {
    fn new(source: &'a mut dyn EventSource) -> Self {
        Self { source, closed: false }
    }

    fn close(mut self) -> Result<()> {
        self.closed = true;
        self.source.close()
    }
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        if !self.closed {
            log::debug!("closing event source after early exit");
            if let Err(e) = self.source.close() {
                log::warn!("failed to close event source: {e}");
            }
        }
    }
}

/// Process every event of `source` (or the first `max_events`) in order.
///
/// The source is closed before any accumulator is finalized, and also when
/// a read error aborts the run.
pub fn run(
    source: &mut dyn EventSource,
    ranges: &AnalysisRanges,
    config: &RunConfig,
    max_events: Option<usize>,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let extractor = ObservableExtractor::new(config.calibration, config.geometry);
    let mut acc = AccumulatorSet::new(ranges)?;

    let entries = source.entries();
    let limit = max_events.map_or(entries, |m| m.min(entries));
    if limit < entries {
        log::info!("processing first {limit} of {entries} events");
    } else {
        log::info!("processing {entries} events");
    }

    let mut guard = SourceGuard::new(source);
    let mut n = 0usize;
    while n < limit {
        if config.progress_every > 0 && n % config.progress_every == 0 {
            log::info!("analyzing event {n} ...");
        }
        let Some(event) = guard.source.next_event()? else {
            log::warn!("source ended after {n} of {entries} announced events");
            break;
        };
        acc.fill_event(&extractor.extract(&event));
        n += 1;
    }
    guard.close()?;
    log::debug!("event source closed after {n} events");

    let summary = RunSummary {
        events: acc.events(),
        entries,
        leak_tally: acc.leak_tally(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    log::info!(
        "processed {} events in {:.2}s ({} leak entries)",
        summary.events,
        summary.elapsed_secs,
        summary.leak_tally.total()
    );
    Ok(RunOutcome { summary, histograms: acc.finalize() })
}
