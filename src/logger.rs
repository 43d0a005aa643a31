use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Summary = 1,   // One line per session (default)
    Detailed = 2,  // Strategy decisions, degraded lookups, warnings
    Debug = 3,     // Every fetch, port attempt and extractor count
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default filter directive; RUST_LOG overrides it
    pub fn filter_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Summary => "recon_agent=info,warn",
            VerbosityLevel::Detailed => "recon_agent=debug,warn",
            VerbosityLevel::Debug => "recon_agent=trace,info",
        }
    }
}

fn env_filter(verbosity: VerbosityLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()))
}

/// Install the global subscriber: stderr always, plus an execution log file
/// when one is given. The file receives the same events without ANSI colors.
pub fn init(verbosity: VerbosityLevel, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open execution log: {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
