//! File-backed document writer
//!
//! Appends each payload to a plain-text document. A Graph collection
//! (`{"value": [{"name": ...}, ...]}`) is written as one item name per
//! line; any other payload is written as pretty-printed JSON.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use host::{DocumentWriter, HostError};
use tracing::debug;

pub struct FileDocumentWriter {
    path: PathBuf,
}

impl FileDocumentWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Text appended to the document for one payload.
pub fn render(data: &serde_json::Value) -> String {
    if let Some(items) = data.get("value").and_then(serde_json::Value::as_array) {
        let names: Vec<&str> = items
            .iter()
            .filter_map(|item| item.get("name").and_then(serde_json::Value::as_str))
            .collect();
        if !names.is_empty() || items.is_empty() {
            return names.iter().map(|name| format!("{name}\n")).collect();
        }
    }
    let mut pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    pretty.push('\n');
    pretty
}

impl DocumentWriter for FileDocumentWriter {
    fn write(&self, data: &serde_json::Value) -> host::Result<()> {
        let text = render(data);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                HostError::unclassified(format!(
                    "opening document {}: {e}",
                    self.path.display()
                ))
            })?;
        file.write_all(text.as_bytes()).map_err(|e| {
            HostError::unclassified(format!(
                "writing document {}: {e}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), bytes = text.len(), "document updated");
        Ok(())
    }
}
