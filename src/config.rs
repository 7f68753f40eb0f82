use std::path::PathBuf;
use std::time::Duration;

use crate::rates::BestRatePolicy;

pub const DIRECTORY_URL: &str = "https://mortgages.cumortgage.net/start_up.asp";
pub const SITE_URL_PREFIX: &str = "https://mortgages.cumortgage.net/default.asp?siteId=";

/// Everything one harvest run needs to know: where to scrape, where to
/// persist, and how hard to throttle itself.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub directory_url: String,
    pub site_url_prefix: String,
    pub snapshot_path: PathBuf,
    pub ledger_path: PathBuf,
    pub report_path: PathBuf,
    /// Successful scrapes allowed before a mandatory cooldown.
    pub batch_cap: usize,
    pub cooldown: Duration,
    pub listing_timeout: Duration,
    pub site_timeout: Duration,
    pub best_rate_policy: BestRatePolicy,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        HarvestConfig {
            directory_url: DIRECTORY_URL.to_string(),
            site_url_prefix: SITE_URL_PREFIX.to_string(),
            snapshot_path: PathBuf::from("mortgage_rates.csv"),
            ledger_path: PathBuf::from("processed.log"),
            report_path: PathBuf::from("mortgage_rates.html"),
            batch_cap: 10,
            cooldown: Duration::from_secs(120),
            listing_timeout: Duration::from_secs(60),
            site_timeout: Duration::from_secs(120),
            best_rate_policy: BestRatePolicy::LowestOverall,
        }
    }
}

impl HarvestConfig {
    /// Rebase all output files into `dir`, leaving the scrape targets alone.
    pub fn in_dir(mut self, dir: &std::path::Path) -> Self {
        self.snapshot_path = dir.join("mortgage_rates.csv");
        self.ledger_path = dir.join("processed.log");
        self.report_path = dir.join("mortgage_rates.html");
        self
    }
}
