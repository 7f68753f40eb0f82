use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::HarvestConfig;
use crate::fetch::{FetchError, RatePayload, SiteFetcher};
use crate::rates::RateQuote;

/// Live `SiteFetcher` over plain HTTP. The rate pages render their tables
/// server-side inside `#rate_box`, so a headless browser is not required.
pub struct HttpFetcher {
    client: Client,
    listing_timeout: Duration,
    site_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HarvestConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(HttpFetcher {
            client,
            listing_timeout: config.listing_timeout,
            site_timeout: config.site_timeout,
        })
    }

    fn random_user_agent(&self) -> &'static str {
        let uas = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];
        use rand::Rng;
        let mut rng = rand::thread_rng();
        uas[rng.gen_range(0..uas.len())]
    }

    fn get_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, self.random_user_agent())
            .timeout(timeout)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            warn!("HTTP {} from {}", status, url);
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(resp.text()?)
    }
}

impl SiteFetcher for HttpFetcher {
    fn fetch_listing(&self, url: &str) -> Result<String, FetchError> {
        let html = self.get_page(url, self.listing_timeout)?;
        let lines = extract_listing_lines(&html, url);
        info!("Directory page yielded {} raw entries", lines.len());
        Ok(lines.join("\n"))
    }

    fn fetch_rates(&self, name: &str, url: &str) -> Result<RatePayload, FetchError> {
        debug!("Fetching rates for {}", name);
        let html = self.get_page(url, self.site_timeout)?;
        let quotes = parse_rate_box(&html);
        Ok(RatePayload::new(quotes))
    }
}

/// Pulls `<siteId>><name>` lines out of the directory page. Sites appear
/// either as `<option value="id">Name</option>` pickers or as anchors whose
/// href carries a `siteId` query parameter.
fn extract_listing_lines(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let option_sel = Selector::parse("option[value]").unwrap();
    let anchor_sel = Selector::parse("a[href]").unwrap();

    let mut lines = Vec::new();

    for option in document.select(&option_sel) {
        let site_id = option.value().attr("value").unwrap_or("").trim();
        let name = option.text().collect::<String>();
        if !site_id.is_empty() && site_id.chars().all(|c| c.is_ascii_digit()) {
            lines.push(format!("{}>{}", site_id, name.trim()));
        }
    }

    let base = Url::parse(base_url).ok();
    for anchor in document.select(&anchor_sel) {
        let href = anchor.value().attr("href").unwrap_or("");
        if !href.contains("siteId=") {
            continue;
        }
        let resolved = match &base {
            Some(b) => b.join(href).ok(),
            None => Url::parse(href).ok(),
        };
        let Some(resolved) = resolved else { continue };
        let Some((_, site_id)) = resolved.query_pairs().find(|(k, _)| k == "siteId") else {
            continue;
        };
        let name = anchor.text().collect::<String>();
        if !site_id.trim().is_empty() {
            lines.push(format!("{}>{}", site_id.trim(), name.trim()));
        }
    }

    lines
}

/// Walks `#rate_box` the way the sites lay it out: one table per loan
/// program family, a `<caption>` naming it, and screen-reader labels in
/// front of the actual figures.
fn parse_rate_box(html: &str) -> Vec<RateQuote> {
    let document = Html::parse_document(html);
    let rate_box_sel = Selector::parse("#rate_box").unwrap();
    let table_sel = Selector::parse("table").unwrap();
    let caption_sel = Selector::parse("caption").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let label_sel = Selector::parse("span.sr-only").unwrap();

    let Some(rate_box) = document.select(&rate_box_sel).next() else {
        return Vec::new();
    };

    let mut quotes = Vec::new();
    for table in rate_box.select(&table_sel) {
        let Some(caption) = table.select(&caption_sel).next() else {
            continue;
        };
        let loan_type = clean_loan_type(&caption.text().collect::<String>());

        for row in table.select(&row_sel) {
            for label in row.select(&label_sel) {
                let label_text = label.text().collect::<String>();
                if label_text.trim() != "Interest Rate" {
                    continue;
                }
                if let Some(rate_text) = following_text(&label) {
                    quotes.push(RateQuote::new(&loan_type, &rate_text));
                }
            }
        }
    }
    quotes
}

/// Captions carry conforming/jumbo suffixes that the report does not need.
fn clean_loan_type(caption: &str) -> String {
    caption
        .replace(" - Conforming", "")
        .replace(" - Jumbo", "")
        .trim()
        .to_string()
}

/// The figure itself is the first non-blank text node after the label span.
fn following_text(element: &ElementRef) -> Option<String> {
    let mut node = element.next_sibling();
    while let Some(n) = node {
        if let Some(text) = n.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        } else if n.value().is_element() {
            return None;
        }
        node = n.next_sibling();
    }
    None
}
