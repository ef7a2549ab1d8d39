use crate::indicator::IndicatorView;
use panelmon_core::Snapshot;
use serde_json::{json, Map, Value};
use std::{
    io::{self, Write},
    time::UNIX_EPOCH,
};

/// Output format for non-interactive modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// The panel label, one per line
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

/// Writes one line per snapshot, for status bars that read a pipe
pub struct LinePrinter<W: Write> {
    writer: W,
    format: LineFormat,
    view: IndicatorView,
}

impl<W: Write> LinePrinter<W> {
    pub fn new(writer: W, format: LineFormat, view: IndicatorView) -> Self {
        Self {
            writer,
            format,
            view,
        }
    }

    pub fn print(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let line = match self.format {
            LineFormat::Plain => self.view.panel_label(snapshot),
            LineFormat::Json => json_line(snapshot).to_string(),
        };
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// `{"timestamp_ms":..,"interval_secs":2,"cpu":12.5,"gpu":null,"errors":{"gpu":"not installed"}}`
///
/// Disabled kinds are left out.
fn json_line(snapshot: &Snapshot) -> Value {
    let timestamp_ms = snapshot
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut record = Map::new();
    record.insert("timestamp_ms".into(), json!(timestamp_ms));
    record.insert("interval_secs".into(), json!(snapshot.interval_secs));

    let mut errors = Map::new();
    for reading in snapshot.readings() {
        if !snapshot.is_enabled(reading.kind) {
            continue;
        }
        let key = reading.kind.to_string();
        record.insert(key.clone(), json!(reading.value()));
        if let Some(err) = reading.error {
            errors.insert(key, json!(err.to_string()));
        }
    }
    record.insert("errors".into(), Value::Object(errors));

    Value::Object(record)
}
