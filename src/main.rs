use std::error::Error;

use log::{error, info};

use mortgage_scraper_lib::{logger, HarvestConfig, Harvester, HttpFetcher};

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    info!("Starting mortgage rate harvest...");

    let config = HarvestConfig::default();
    let fetcher = HttpFetcher::new(&config)?;
    let mut harvester = Harvester::new(config, fetcher);

    match harvester.run() {
        Ok(summary) => {
            info!(
                "Done. Scraped {} of {} credit unions ({} skipped, {} failed).",
                summary.scraped, summary.resolved, summary.skipped, summary.failed
            );
            Ok(())
        }
        Err(e) => {
            error!("Harvest aborted: {}", e);
            Err(e.into())
        }
    }
}
