//! Append-only upload log.
//!
//! One tab-separated line per successful upload:
//! `timestamp \t basename \t asset id \t details-as-JSON`.
//! Control characters and backslashes inside a field are backslash-escaped
//! (`\t`, `\n`, `\r`, `\\`) so every entry stays one four-field line.

use chrono::{DateTime, Local, SecondsFormat};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::types::AssetDetails;
use crate::error::Result;

/// A single line of the upload log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub basename: String,
    pub asset_id: String,
    pub details: AssetDetails,
}

impl LogEntry {
    pub fn new(
        basename: impl Into<String>,
        asset_id: impl Into<String>,
        details: AssetDetails,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            basename: basename.into(),
            asset_id: asset_id.into(),
            details,
        }
    }

    /// Render the line, including the trailing newline.
    pub fn to_line(&self) -> Result<String> {
        Ok(format!(
            "{}\t{}\t{}\t{}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
            escape_field(&self.basename),
            escape_field(&self.asset_id),
            serde_json::to_string(&self.details)?
        ))
    }

    /// Append this entry to `path`, creating the file if needed, and flush.
    pub async fn append_to(&self, path: &Path) -> Result<()> {
        let line = self.to_line()?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        tracing::debug!("Logged upload of {} to {}", self.asset_id, path.display());
        Ok(())
    }
}

fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
