use thiserror::Error;

use crate::rates::RateQuote;

/// What a successful per-site fetch hands back: every (program, rate) pair
/// the page exposed. Selecting and serializing them is the harvester's job.
#[derive(Debug, Clone, Default)]
pub struct RatePayload {
    pub quotes: Vec<RateQuote>,
}

impl RatePayload {
    pub fn new(quotes: Vec<RateQuote>) -> Self {
        RatePayload { quotes }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed page: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// The slow, unreliable outside world behind one seam: fetching the
/// directory listing and fetching a single site's rates. Both calls are
/// bounded-time; both may fail without taking the run down.
pub trait SiteFetcher {
    /// Returns the raw directory listing, one `<siteId>><name>` line per
    /// credit union.
    fn fetch_listing(&self, url: &str) -> Result<String, FetchError>;

    /// Fetches and parses one site's published rates. A page with no rate
    /// tables is a success with an empty payload, not an error.
    fn fetch_rates(&self, name: &str, url: &str) -> Result<RatePayload, FetchError>;
}
