use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recon-agent")]
#[command(about = "Periodically scrape one website, extract business details, probe its host and log each session")]
#[command(version)]
pub struct Cli {
    /// Website to watch (e.g. https://www.tesla.com/); https:// is assumed when no scheme is given
    #[arg(value_name = "URL", required_unless_present = "init")]
    pub url: Option<String>,

    /// Company name used for knowledge-base enrichment (defaults to the URL host)
    #[arg(short, long)]
    pub company: Option<String>,

    /// Configuration file (defaults to ./config/recon-agent.toml, then built-in defaults)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Create default configuration file at ./config/recon-agent.toml
    #[arg(long)]
    pub init: bool,

    /// Run a single session and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between sessions (overrides config)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Session log path (overrides config)
    #[arg(long, value_name = "PATH")]
    pub session_log: Option<PathBuf>,

    /// Verbose logging (use -v for detail, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Export execution logs to a file (specify file path)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
