//! # dr-analysis
//!
//! The event-aggregation core of drana: per-event observables, the run's
//! accumulator set and the driver loop tying an [`dr_event::EventSource`] to
//! them.
//!
//! ```
//! use dr_analysis::{AnalysisRanges, RunConfig, run};
//! use dr_event::MemorySource;
//!
//! let ranges = AnalysisRanges::new(0.0, 20.0, 40.0).unwrap();
//! let mut source = MemorySource::new(vec![Default::default(); 3]);
//! let outcome = run(&mut source, &ranges, &RunConfig::default(), None).unwrap();
//! assert_eq!(outcome.summary.events, 3);
//! assert_eq!(outcome.histograms.energy.total_weight(), 3.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulators;
pub mod config;
pub mod extract;
pub mod pipeline;

pub use accumulators::{AccumulatorSet, AnalysisRanges, FinalizedAccumulators, LeakTally};
pub use config::{Calibration, FitSettings, Geometry, RunConfig};
pub use extract::{DerivedObservables, EventContributions, LeakClass, ObservableExtractor};
pub use pipeline::{RunOutcome, RunSummary, run};
