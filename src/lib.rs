pub mod config;
pub mod directory;
pub mod fetch;
pub mod harvester;
pub mod ledger;
pub mod logger;
pub mod rates;
pub mod report;
pub mod scraper;
pub mod snapshot;
pub mod throttle;

// Exporting types for convenience
pub use config::HarvestConfig;
pub use directory::Endpoint;
pub use fetch::{FetchError, RatePayload, SiteFetcher};
pub use harvester::{HarvestError, HarvestSummary, Harvester};
pub use ledger::{LedgerEntry, Outcome, ResumeLedger};
pub use rates::{BestRatePolicy, EndpointRecord, RateQuote};
pub use scraper::HttpFetcher;
pub use throttle::BatchThrottle;
