//! # dr-event
//!
//! Event records produced by the dual-readout calorimeter simulation and the
//! sources that yield them one at a time.
//!
//! ```no_run
//! use dr_event::{EventSource, JsonLinesSource};
//!
//! let mut src = JsonLinesSource::open("events.jsonl").unwrap();
//! println!("{} events", src.entries());
//! while let Some(evt) = src.next_event().unwrap() {
//!     println!("{} towers", evt.towers.len());
//! }
//! src.close().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod model;
pub mod source;

pub use model::{EnergyDeposit, EventRecord, LeakParticle, Sipm, SpectrumBin, Tower};
pub use source::{EventSource, JsonLinesSource, MemorySource, open_source};
