use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::LogFormat;
use crate::enrichment::EnrichmentRecord;
use crate::extract::ExtractionResult;
use crate::probe::ProbeResult;
use crate::retriever::Strategy;
use crate::target::Target;

/// Everything one agent iteration found
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub target: Target,
    pub probe: ProbeResult,
    pub strategy: Strategy,
    pub content_summary: String,
    pub extraction: ExtractionResult,
    pub enrichment: EnrichmentRecord,
}

impl SessionRecord {
    /// Human-readable block, one per session
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        // Infallible: writing into a String
        let _ = writeln!(out, "\n\n=== Scrape Session at {} ===", self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f UTC"));
        let _ = writeln!(out, "Target: {}", self.target);
        let _ = writeln!(out, "Resolved IP: {}", self.probe.resolved);

        match &self.probe.open_ports {
            Some(ports) => {
                let ports = ports.iter().map(u16::to_string).collect::<Vec<_>>().join(", ");
                let _ = writeln!(out, "Open Ports: [{}]", ports);
            }
            None => {
                let _ = writeln!(out, "Skipped port scan due to DNS resolution failure.");
            }
        }

        let _ = writeln!(out, "Strategy: {}", self.strategy);
        let _ = writeln!(out, "Top Content:");
        let _ = writeln!(out, "{}", self.content_summary);

        render_section(&mut out, &self.extraction.services, "Services Found:", "No services found.");
        render_section(&mut out, &self.extraction.categories, "Categories Found:", "No categories found.");
        render_section(&mut out, &self.extraction.locations, "Locations Found:", "No locations found.");
        render_section(
            &mut out,
            &self.extraction.posts,
            "Possible blog/news/article links:",
            "No obvious post/article links found.",
        );

        let _ = writeln!(out, "\nStructured Data (Wikipedia):");
        for (label, value) in self.enrichment.iter() {
            let _ = writeln!(out, "{}: {}", label, value);
        }

        out
    }
}

fn render_section<'a, I>(out: &mut String, items: I, found: &str, none: &str)
where
    I: IntoIterator<Item = &'a String>,
{
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        let _ = writeln!(out, "{}", none);
        return;
    }
    let _ = writeln!(out, "{}", found);
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

/// Append-only sink for session records.
///
/// The file is opened per append so an externally rotated or deleted log is
/// recreated on the next session.
pub struct SessionLogger {
    path: PathBuf,
    format: LogFormat,
}

impl SessionLogger {
    pub fn new(path: impl Into<PathBuf>, format: LogFormat) -> Self {
        Self { path: path.into(), format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &SessionRecord) -> Result<()> {
        let entry = match self.format {
            LogFormat::Text => record.render_text(),
            LogFormat::Jsonl => {
                let mut line = serde_json::to_string(record)
                    .context("Failed to serialize session record")?;
                line.push('\n');
                line
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open session log: {}", self.path.display()))?;

        file.write_all(entry.as_bytes())
            .with_context(|| format!("Failed to write session log: {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("Failed to flush session log: {}", self.path.display()))?;

        debug!("Appended session record to {}", self.path.display());
        Ok(())
    }
}
