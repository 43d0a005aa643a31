#![allow(dead_code)]

pub mod fake_browser;
pub mod fixtures;
pub mod wiremock_helpers;

use recon_agent::config::AppConfig;
use std::path::Path;

/// Built-in defaults pointed at local mocks, with no settle delay and a
/// short probe timeout so tests stay fast.
pub fn test_config(knowledge_base: &str, session_log: &Path, ports: Vec<u16>) -> AppConfig {
    let mut config = AppConfig::embedded().expect("bundled config is valid");
    config.http.request_timeout_secs = 2;
    config.browser.settle_delay_secs = 0;
    config.probe.ports = ports;
    config.probe.connect_timeout_ms = 300;
    config.enrichment.base_url = format!("{}/wiki/", knowledge_base);
    config.agent.interval_secs = 3600;
    config.agent.session_log_path = session_log.to_path_buf();
    config
}
