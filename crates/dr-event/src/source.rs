//! Event sources: sequential, ordered access to event records.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::{Path, PathBuf};

use dr_core::{Error, Result};

use crate::model::EventRecord;

/// Ordered, finite sequence of event records.
///
/// Implementations yield each record exactly once, in storage order.
pub trait EventSource {
    /// Total number of events in the source.
    fn entries(&self) -> usize;

    /// Number of events yielded so far.
    fn position(&self) -> usize;

    /// Read the next event, `Ok(None)` once the source is exhausted.
    fn next_event(&mut self) -> Result<Option<EventRecord>>;

    /// Release the underlying handle. Calling it more than once is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;
}

/// Open an event file, picking the reader from the extension.
///
/// `.json` files hold a single JSON array of records and are loaded eagerly;
/// everything else is read as JSON Lines (one record per line).
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn EventSource>> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Box::new(MemorySource::from_json_file(path)?)),
        _ => Ok(Box::new(JsonLinesSource::open(path)?)),
    }
}

/// Decode one record, salvaging what fits the schema. Never fails: a record
/// that is not JSON at all comes back empty. Problems are logged with the
/// record's index.
fn decode_record(text: &str, index: usize) -> EventRecord {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{}", Error::MalformedEvent { index, message: e.to_string() });
            return EventRecord::default();
        }
    };
    decode_value(&value, index)
}

fn decode_value(value: &serde_json::Value, index: usize) -> EventRecord {
    let (record, dropped) = EventRecord::from_value_lenient(value);
    if dropped > 0 {
        log::warn!(
            "{}",
            Error::MalformedEvent { index, message: format!("dropped {dropped} undecodable item(s)") }
        );
    }
    record
}

/// Streaming reader for JSON Lines event files.
///
/// Blank lines are ignored. The total count is established by a first pass
/// over the file at open time. A line that does not decode still counts as an
/// event: its well-formed parts are kept and the rest is logged.
pub struct JsonLinesSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    entries: usize,
    position: usize,
    line: String,
}

impl JsonLinesSource {
    /// Open `path` and count its records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source: std::io::Error| Error::SourceOpen { path: path.clone(), source };

        let file = File::open(&path).map_err(open_err)?;
        let mut reader = BufReader::new(file);

        let mut entries = 0usize;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).map_err(open_err)? == 0 {
                break;
            }
            if !line.trim().is_empty() {
                entries += 1;
            }
        }
        reader.rewind().map_err(open_err)?;

        log::debug!("opened {} ({entries} events)", path.display());
        Ok(Self { path, reader: Some(reader), entries, position: 0, line })
    }

    /// Path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for JsonLinesSource {
    fn entries(&self) -> usize {
        self.entries
    }

    fn position(&self) -> usize {
        self.position
    }

    fn next_event(&mut self) -> Result<Option<EventRecord>> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(Error::Validation(format!(
                "event source {} is closed",
                self.path.display()
            )));
        };
        loop {
            self.line.clear();
            if reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            let record = match serde_json::from_str(text) {
                Ok(record) => record,
                Err(_) => decode_record(text, self.position),
            };
            self.position += 1;
            return Ok(Some(record));
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            log::debug!("closed {} after {} events", self.path.display(), self.position);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

/// Event source backed by records held in memory.
pub struct MemorySource {
    events: std::vec::IntoIter<EventRecord>,
    entries: usize,
    position: usize,
    closed: bool,
}

impl MemorySource {
    /// Wrap an owned list of records.
    pub fn new(events: Vec<EventRecord>) -> Self {
        let entries = events.len();
        Self { events: events.into_iter(), entries, position: 0, closed: false }
    }

    /// Load a JSON file containing an array of records.
    ///
    /// A file that is not a JSON array fails to open. Individual records
    /// are decoded leniently, like JSON Lines records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let open_err =
            |source: std::io::Error| Error::SourceOpen { path: path.to_path_buf(), source };
        let text = std::fs::read_to_string(path).map_err(open_err)?;
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&text).map_err(|e| open_err(e.into()))?;
        let events = values.iter().enumerate().map(|(i, v)| decode_value(v, i)).collect();
        Ok(Self::new(events))
    }
}

impl EventSource for MemorySource {
    fn entries(&self) -> usize {
        self.entries
    }

    fn position(&self) -> usize {
        self.position
    }

    fn next_event(&mut self) -> Result<Option<EventRecord>> {
        if self.closed {
            return Err(Error::Validation("event source is closed".into()));
        }
        let next = self.events.next();
        if next.is_some() {
            self.position += 1;
        }
        Ok(next)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_yields_in_order() {
        let events = (0..3)
            .map(|i| EventRecord {
                energy_deposits: vec![crate::EnergyDeposit { energy: i as f64 }],
                ..Default::default()
            })
            .collect();
        let mut src = MemorySource::new(events);
        assert_eq!(src.entries(), 3);
        let mut seen = Vec::new();
        while let Some(evt) = src.next_event().unwrap() {
            seen.push(evt.energy_deposits[0].energy);
        }
        assert_eq!(seen, vec![0.0, 1.0, 2.0]);
        assert_eq!(src.position(), 3);
        src.close().unwrap();
        assert!(src.is_closed());
        assert!(src.next_event().is_err());
    }

    #[test]
    fn non_json_record_decodes_empty() {
        assert_eq!(decode_record("not json", 4), EventRecord::default());
        let evt = decode_record(r#"{"Edeps": [{"Edep": 2.0}], "leaks": {}}"#, 5);
        assert_eq!(evt.energy_deposits.len(), 1);
        assert!(evt.leaks.is_empty());
    }
}
