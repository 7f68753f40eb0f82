use std::io;

use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use thiserror::Error;

use crate::config::HarvestConfig;
use crate::directory;
use crate::fetch::{FetchError, SiteFetcher};
use crate::ledger::{self, LedgerEntry, ResumeLedger};
use crate::rates::EndpointRecord;
use crate::report;
use crate::snapshot;
use crate::throttle::BatchThrottle;

/// Fatal conditions only. Everything that can go wrong with a single
/// endpoint is handled inside the loop and never surfaces here.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to fetch credit union directory: {0}")]
    Directory(#[from] FetchError),
    #[error("credit union directory resolved to an empty list")]
    EmptyDirectory,
    #[error("ledger I/O failed: {0}")]
    Ledger(#[from] io::Error),
    #[error("snapshot I/O failed: {0}")]
    Snapshot(#[from] csv::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub resolved: usize,
    pub scraped: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drives one harvest run: resolve targets, skip what already succeeded
/// today, fetch the rest one at a time, persist after every success, and
/// pause between batches. Killing the process at any point loses at most
/// the endpoint in flight.
pub struct Harvester<F: SiteFetcher> {
    config: HarvestConfig,
    fetcher: F,
    throttle: BatchThrottle,
}

impl<F: SiteFetcher> Harvester<F> {
    pub fn new(config: HarvestConfig, fetcher: F) -> Self {
        let throttle = BatchThrottle::new(config.batch_cap, config.cooldown);
        Harvester {
            config,
            fetcher,
            throttle,
        }
    }

    /// Test hook: replace the throttle (and with it the sleep behavior).
    pub fn with_throttle(mut self, throttle: BatchThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn run(&mut self) -> Result<HarvestSummary, HarvestError> {
        self.run_on(Local::now().date_naive())
    }

    /// The run loop, pinned to an explicit calendar day so resume and
    /// day-rollover behavior is deterministic under test.
    pub fn run_on(&mut self, today: NaiveDate) -> Result<HarvestSummary, HarvestError> {
        let endpoints = directory::resolve(
            &self.fetcher,
            &self.config.directory_url,
            &self.config.site_url_prefix,
        )?;
        if endpoints.is_empty() {
            return Err(HarvestError::EmptyDirectory);
        }

        let processed = ledger::processed_on(&self.config.ledger_path, today)?;
        let mut summary = HarvestSummary {
            resolved: endpoints.len(),
            ..Default::default()
        };

        if processed.len() == endpoints.len() {
            info!(
                "All {} credit unions already processed today, nothing to do",
                endpoints.len()
            );
            summary.skipped = endpoints.len();
            return Ok(summary);
        }

        let mut dataset = snapshot::load(&self.config.snapshot_path, today)?;
        let mut ledger = ResumeLedger::open(&self.config.ledger_path)?;
        ledger.append(&LedgerEntry::info(&format!(
            "Run started, {} credit unions resolved, {} already done today",
            endpoints.len(),
            processed.len()
        )))?;

        for endpoint in &endpoints {
            if processed.contains(&endpoint.url) {
                ledger.append(&LedgerEntry::skipped(&endpoint.url, &endpoint.name))?;
                summary.skipped += 1;
                continue;
            }

            self.throttle.pause_if_due();

            info!("Scraping {} ({})", endpoint.name, endpoint.url);
            match self.fetcher.fetch_rates(&endpoint.name, &endpoint.url) {
                Ok(payload) => {
                    let record = EndpointRecord::from_quotes(
                        &endpoint.name,
                        &endpoint.url,
                        &payload.quotes,
                        self.config.best_rate_policy,
                    );
                    dataset.insert(endpoint.url.clone(), record);
                    ledger.append(&LedgerEntry::success(&endpoint.url, &endpoint.name))?;
                    // Persisting after every success is what makes a kill
                    // mid-run resumable.
                    snapshot::save(&self.config.snapshot_path, &dataset)?;
                    self.throttle.record_success();
                    summary.scraped += 1;
                }
                Err(e) => {
                    warn!("Scrape failed for {} ({}): {}", endpoint.name, endpoint.url, e);
                    ledger.append(&LedgerEntry::error(&endpoint.url, &e.to_string()))?;
                    summary.failed += 1;
                }
            }
        }

        snapshot::save(&self.config.snapshot_path, &dataset)?;

        // The report is a convenience artifact; the dataset is already safe.
        if let Err(e) = report::write(&self.config.report_path, &dataset) {
            error!("HTML report generation failed: {}", e);
        }

        info!(
            "Harvest complete: {} scraped, {} skipped, {} failed of {} resolved",
            summary.scraped, summary.skipped, summary.failed, summary.resolved
        );
        Ok(summary)
    }
}
