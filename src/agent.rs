//! The agent loop: one strictly sequential pipeline per tick, then a fixed
//! pause measured from the end of the tick, until shutdown is signalled.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::browser_pool::BrowserLauncher;
use crate::classifier::SiteClassifier;
use crate::config::AppConfig;
use crate::enrichment::KnowledgeBase;
use crate::extract::ExtractorSet;
use crate::probe::NetworkProbe;
use crate::retriever::{build_http_client, Retriever};
use crate::session_log::{SessionLogger, SessionRecord};
use crate::target::Target;

/// Sending `true` asks a running agent to stop after its current iteration
pub type ShutdownSender = watch::Sender<bool>;
pub type ShutdownReceiver = watch::Receiver<bool>;

pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    watch::channel(false)
}

pub struct Agent {
    target: Target,
    probe: NetworkProbe,
    classifier: SiteClassifier,
    retriever: Retriever,
    extractors: ExtractorSet,
    knowledge_base: KnowledgeBase,
    session_log: SessionLogger,
    interval: Duration,
}

impl Agent {
    pub fn new(config: &AppConfig, target: Target, launcher: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let client = build_http_client(&config.http)?;

        Ok(Self {
            target,
            probe: NetworkProbe::from_config(&config.probe),
            classifier: SiteClassifier::new(client.clone()),
            retriever: Retriever::from_config(config, client.clone(), launcher),
            extractors: ExtractorSet::new().context("Failed to compile extraction rules")?,
            knowledge_base: KnowledgeBase::new(client, &config.enrichment),
            session_log: SessionLogger::new(config.agent.session_log_path.clone(), config.agent.log_format),
            interval: config.agent.interval(),
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Probe, classify, retrieve, extract, enrich and log once.
    ///
    /// Probe, classification and enrichment failures degrade into the record;
    /// retrieval and log-write failures are returned.
    pub async fn run_iteration(&self) -> Result<SessionRecord> {
        let timestamp = Utc::now();
        let url = self.target.url();
        info!("Starting session for {}", self.target);

        let probe = self.probe.probe(url).await;
        debug!("Probe result for {}: {} {:?}", url, probe.resolved, probe.open_ports);

        let strategy = self.classifier.classify(url).await;
        info!("Strategy for {}: {}", url, strategy);

        // The parsed page lives only until extraction is done
        let (content_summary, extraction) = {
            let retrieval = self.retriever.retrieve(strategy, url).await
                .with_context(|| format!("{} retrieval failed for {}", strategy, url))?;
            let extraction = self.extractors.extract_all(&retrieval.document);
            (retrieval.content_summary, extraction)
        };

        let enrichment = self.knowledge_base.lookup(self.target.company_name()).await;

        let record = SessionRecord {
            timestamp,
            target: self.target.clone(),
            probe,
            strategy,
            content_summary,
            extraction,
            enrichment,
        };

        self.session_log.append(&record)?;

        info!(
            "Session for {} finished: {} service(s), {} categor(ies), {} location(s), {} post link(s), {} fact(s)",
            self.target.company_name(),
            record.extraction.services.len(),
            record.extraction.categories.len(),
            record.extraction.locations.len(),
            record.extraction.posts.len(),
            record.enrichment.len(),
        );

        Ok(record)
    }

    /// Run iterations until `shutdown` carries `true` (or its sender is gone).
    /// Returns the number of completed iterations. A failing iteration stops
    /// the loop with that error.
    pub async fn run(&self, mut shutdown: ShutdownReceiver) -> Result<u64> {
        let mut completed = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_iteration().await?;
            completed += 1;

            debug!("Sleeping {:?} before next session", self.interval);
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Agent stopped after {} session(s)", completed);
        Ok(completed)
    }
}
