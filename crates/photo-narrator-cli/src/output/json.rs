//! Prediction records and their JSON/text writers.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use photo_narrator_core::{AppState, Phase, Prediction};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Outcome of one image request, as written to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    /// Image URI, or the requested path when nothing was selected.
    pub image: String,
    /// RFC 3339 time the record was produced.
    pub timestamp: String,
    /// Predictions in classifier order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<Prediction>>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the user dismissed the picker.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl PredictionRecord {
    /// Builds a record from the controller state after a request.
    #[must_use]
    pub fn from_state(requested: &str, state: &AppState) -> Self {
        let image = state
            .current_image
            .as_ref()
            .map_or_else(|| requested.to_string(), |i| i.uri().to_string());
        Self {
            image,
            timestamp: now(),
            predictions: state.predictions.clone(),
            error: state.error.as_ref().map(ToString::to_string),
            cancelled: state.phase == Phase::Ready,
        }
    }

    /// Returns true if the request failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Renders the record as a single human-readable line.
    #[must_use]
    pub fn to_text(&self) -> String {
        if let Some(error) = &self.error {
            return format!("{}: error: {error}", self.image);
        }
        if self.cancelled {
            return format!("{}: cancelled", self.image);
        }
        let labels: Vec<String> = self
            .predictions
            .iter()
            .flatten()
            .map(|p| format!("{} ({:.1}%)", p.label, p.confidence * 100.0))
            .collect();
        format!("{}: {}", self.image, labels.join(", "))
    }
}

fn now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Record writer for text, JSON Lines and JSON array output.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one record as a JSON line.
    pub fn write_line(&self, record: &PredictionRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.write_raw(&json)
    }

    /// Writes one record as text.
    pub fn write_text(&self, record: &PredictionRecord) -> Result<()> {
        self.write_raw(&record.to_text())
    }

    /// Writes a batch of records as a JSON array.
    pub fn write_array(&self, records: &[PredictionRecord], pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };
        self.write_raw(&json)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_raw(&self, line: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use photo_narrator_core::{FailureKind, ImageRef};

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn done_state() -> AppState {
        AppState {
            phase: Phase::Done,
            model_ready: true,
            runtime_ready: true,
            current_image: Some(ImageRef::new("file:///img1.jpg")),
            predictions: Some(vec![Prediction::new("cat", 0.9), Prediction::new("dog", 0.05)]),
            error: None,
            generation: 1,
        }
    }

    #[test]
    fn test_record_from_done_state() {
        let record = PredictionRecord::from_state("img1.jpg", &done_state());
        assert_eq!(record.image, "file:///img1.jpg");
        assert!(!record.is_failure());
        assert_eq!(record.to_text(), "file:///img1.jpg: cat (90.0%), dog (5.0%)");
    }

    #[test]
    fn test_record_from_failed_state() {
        let state = AppState {
            phase: Phase::Failed,
            predictions: None,
            error: Some(FailureKind::Decode("bad bytes".into())),
            ..done_state()
        };
        let record = PredictionRecord::from_state("img1.jpg", &state);
        assert!(record.is_failure());
        assert!(record.to_text().contains("could not decode image"));
    }

    #[test]
    fn test_json_line_skips_empty_fields() {
        let buffer = Buffer::default();
        let output = JsonOutput::new(Box::new(buffer.clone()));

        output
            .write_line(&PredictionRecord::from_state("img1.jpg", &done_state()))
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(buffer.text().trim()).unwrap();
        assert_eq!(value["predictions"][0]["label"], "cat");
        assert!(value.get("error").is_none());
        assert!(value.get("cancelled").is_none());
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_json_array() {
        let buffer = Buffer::default();
        let output = JsonOutput::new(Box::new(buffer.clone()));
        let record = PredictionRecord::from_state("img1.jpg", &done_state());

        output.write_array(&[record.clone(), record], false).unwrap();

        let value: serde_json::Value = serde_json::from_str(buffer.text().trim()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }
}
