use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use recon_agent::agent::{shutdown_channel, Agent};
use recon_agent::browser_pool::ChromeLauncher;
use recon_agent::cli::Cli;
use recon_agent::config::{AppConfig, ConfigError};
use recon_agent::logger::{self, VerbosityLevel};
use recon_agent::target::Target;

/// Set on the first Ctrl-C; a second one force-exits
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize settings, then run recon-agent again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
    .unwrap_or_else(|e| {
        match e {
            ConfigError::FileNotFound(path) => {
                eprintln!("❌ Configuration file not found at: {}", path.display());
                eprintln!("   Run with --init to create a default configuration file.");
            }
            other => eprintln!("❌ Configuration error: {}", other),
        }
        std::process::exit(1);
    });

    if let Some(secs) = cli.interval {
        config.agent.interval_secs = secs;
    }
    if let Some(path) = &cli.session_log {
        config.agent.session_log_path = path.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }

    let verbosity = VerbosityLevel::from_verbose_count(cli.verbose);
    if let Err(e) = logger::init(verbosity, cli.log_file.as_deref()) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }

    // Guaranteed by clap unless --init, which exited above
    let Some(url) = cli.url.as_deref() else {
        eprintln!("❌ A target URL is required");
        std::process::exit(2);
    };
    let target = Target::new(url, cli.company.as_deref());

    let launcher = Arc::new(ChromeLauncher::from_config(&config.browser));
    let agent = match Agent::new(&config, target, launcher) {
        Ok(agent) => agent,
        Err(e) => {
            error!("Failed to initialize agent: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Watching {} every {}s, logging to {}",
        agent.target(),
        config.agent.interval_secs,
        config.agent.session_log_path.display()
    );

    if cli.once {
        if let Err(e) = agent.run_iteration().await {
            error!("Session failed: {:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    ctrlc::set_handler(move || {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            eprintln!("\n⚠️  Force exiting.");
            std::process::exit(130); // 130 = 128 + SIGINT(2)
        }
        eprintln!("\n⚠️  Interrupt received. Finishing current session, press Ctrl-C again to force exit...");
        let _ = shutdown_tx.send(true);
    }).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to set Ctrl-C handler: {}. Interrupt signals may not be handled gracefully.", e);
    });

    match agent.run(shutdown_rx).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Agent stopped: {:#}", e);
            std::process::exit(1);
        }
    }
}
