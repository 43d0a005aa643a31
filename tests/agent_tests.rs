//! End-to-end agent iterations against local mocks and a fake browser.

mod common;

use common::fake_browser::FakeBrowser;
use common::fixtures::load_fixture;
use common::test_config;
use common::wiremock_helpers::mount_page;
use recon_agent::agent::{shutdown_channel, Agent};
use recon_agent::probe::Resolution;
use recon_agent::retriever::Strategy;
use recon_agent::Target;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

fn server_port(server: &MockServer) -> u16 {
    server.address().port()
}

#[tokio::test]
async fn test_static_session_is_logged() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &load_fixture("company_home.html")).await;
    mount_page(&server, "/wiki/Northwind_Robotics", &load_fixture("wiki_company.html")).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    let config = test_config(&server.uri(), &log_path, vec![server_port(&server)]);
    let browser = FakeBrowser::default();
    let target = Target::new(&format!("{}/", server.uri()), Some("Northwind Robotics"));

    let agent = Agent::new(&config, target, Arc::new(browser.clone())).unwrap();
    let record = agent.run_iteration().await.unwrap();

    assert_eq!(record.probe.resolved, Resolution::Resolved(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    assert_eq!(record.probe.open_ports, Some(vec![server_port(&server)]));
    assert_eq!(record.strategy, Strategy::Static);
    assert_eq!(record.extraction.services.len(), 3);
    assert_eq!(record.enrichment.get("CEO"), Some("Jane Doe"));
    assert_eq!(browser.launched(), 0, "static sessions never start a browser");

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains(&format!("Target: Northwind Robotics - {}/", server.uri())));
    assert!(log.contains("Strategy: Static scrape"));
    assert!(log.contains("- Fleet deployment"));
    assert!(log.contains("Founded: 2003"));
}

#[tokio::test]
async fn test_script_rendered_site_uses_browser() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &load_fixture("spa_shell.html")).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    let config = test_config(&server.uri(), &log_path, vec![server_port(&server)]);
    let browser = FakeBrowser::rendering(&load_fixture("company_home.html"));
    let url = format!("{}/", server.uri());

    let agent = Agent::new(&config, Target::new(&url, None), Arc::new(browser.clone())).unwrap();
    let record = agent.run_iteration().await.unwrap();

    assert_eq!(record.strategy, Strategy::Dynamic);
    assert_eq!(record.extraction.categories, vec!["Home", "Products", "Industries"]);
    assert!(record.enrichment.is_empty());
    assert_eq!(browser.visited(), vec![url]);
    assert_eq!(browser.released(), 1);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Strategy: Dynamic (headless browser) scrape"));
}

#[tokio::test]
async fn test_dns_failure_still_extracts() {
    let kb = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    let config = test_config(&kb.uri(), &log_path, vec![80, 443]);
    let browser = FakeBrowser::rendering(&load_fixture("company_home.html"));

    let target = Target::new("does-not-exist.invalid", None);
    let agent = Agent::new(&config, target, Arc::new(browser)).unwrap();
    let record = agent.run_iteration().await.unwrap();

    assert!(matches!(record.probe.resolved, Resolution::Failed(_)));
    assert_eq!(record.probe.open_ports, None);
    assert_eq!(record.strategy, Strategy::Dynamic);
    assert_eq!(record.extraction.services.len(), 3);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Skipped port scan due to DNS resolution failure."));
}

#[tokio::test]
async fn test_browser_failure_aborts_session_without_logging() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &load_fixture("spa_shell.html")).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    let config = test_config(&server.uri(), &log_path, vec![server_port(&server)]);
    let browser = FakeBrowser { fail_navigate: true, ..FakeBrowser::default() };

    let agent = Agent::new(&config, Target::new(&server.uri(), None), Arc::new(browser.clone())).unwrap();
    let (_tx, rx) = shutdown_channel();

    assert!(agent.run(rx).await.is_err());
    assert_eq!(browser.released(), 1);
    assert!(!log_path.exists());
}

#[tokio::test]
async fn test_log_write_failure_is_an_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &load_fixture("company_home.html")).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("no-such-dir").join("agent_log.txt");
    let config = test_config(&server.uri(), &log_path, vec![server_port(&server)]);

    let agent = Agent::new(&config, Target::new(&server.uri(), None), Arc::new(FakeBrowser::default())).unwrap();
    assert!(agent.run_iteration().await.is_err());
}

#[tokio::test]
async fn test_shutdown_before_start_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    let config = test_config("http://127.0.0.1:9", &log_path, vec![80]);

    let agent = Agent::new(&config, Target::new("http://127.0.0.1:9/", None), Arc::new(FakeBrowser::default())).unwrap();
    let (tx, rx) = shutdown_channel();
    tx.send(true).unwrap();

    assert_eq!(agent.run(rx).await.unwrap(), 0);
    assert!(!log_path.exists());
}

#[tokio::test]
async fn test_shutdown_interrupts_the_pause() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &load_fixture("company_home.html")).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    // Hour-long interval: the test only finishes if shutdown cuts the sleep short
    let config = test_config(&server.uri(), &log_path, vec![server_port(&server)]);
    let agent = Agent::new(&config, Target::new(&server.uri(), None), Arc::new(FakeBrowser::default())).unwrap();
    let (tx, rx) = shutdown_channel();

    let trigger = async {
        while !log_path.exists() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tx.send(true).unwrap();
    };

    let (completed, ()) = tokio::time::timeout(Duration::from_secs(30), async {
        tokio::join!(agent.run(rx), trigger)
    })
    .await
    .expect("agent should stop promptly after shutdown");

    assert_eq!(completed.unwrap(), 1);
}

#[tokio::test]
async fn test_each_iteration_appends_after_a_pause() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &load_fixture("company_home.html")).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent_log.txt");
    let mut config = test_config(&server.uri(), &log_path, vec![server_port(&server)]);
    config.agent.interval_secs = 1;
    let agent = Agent::new(&config, Target::new(&server.uri(), None), Arc::new(FakeBrowser::default())).unwrap();
    let (tx, rx) = shutdown_channel();

    let session_blocks = || {
        std::fs::read_to_string(&log_path)
            .map(|log| log.matches("=== Scrape Session at").count())
            .unwrap_or(0)
    };
    let trigger = async {
        while session_blocks() < 2 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tx.send(true).unwrap();
    };

    let started = std::time::Instant::now();
    let (completed, ()) = tokio::time::timeout(Duration::from_secs(30), async {
        tokio::join!(agent.run(rx), trigger)
    })
    .await
    .expect("agent should stop after the second session");

    assert_eq!(completed.unwrap(), 2);
    assert_eq!(session_blocks(), 2);
    assert!(started.elapsed() >= Duration::from_secs(1), "sessions must be separated by the interval");
}
