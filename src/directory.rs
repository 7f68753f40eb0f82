use std::collections::HashSet;

use log::{info, warn};

use crate::fetch::{FetchError, SiteFetcher};

/// A scrape target from the credit-union directory. The URL is the unique
/// key everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

/// Resolves the current target list from the directory page. An empty list
/// (or a fetch failure) is fatal for the run; the caller decides that.
pub fn resolve<F: SiteFetcher>(
    fetcher: &F,
    directory_url: &str,
    site_url_prefix: &str,
) -> Result<Vec<Endpoint>, FetchError> {
    let listing = fetcher.fetch_listing(directory_url)?;
    let endpoints = parse_listing(&listing, site_url_prefix);
    info!("Resolved {} unique credit unions from directory", endpoints.len());
    Ok(endpoints)
}

/// Each listing line is `<siteId>><rawName>`. Lines without the separator
/// are noise from the fetch layer and get dropped; duplicate site URLs keep
/// their first occurrence.
pub fn parse_listing(listing: &str, site_url_prefix: &str) -> Vec<Endpoint> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut endpoints = Vec::new();

    for line in listing.lines() {
        let Some((site_id, raw_name)) = line.split_once('>') else {
            if !line.trim().is_empty() {
                warn!("Ignoring malformed listing line: {:?}", line);
            }
            continue;
        };
        let url = format!("{}{}", site_url_prefix, site_id.trim());
        if !seen.insert(url.clone()) {
            continue;
        }
        endpoints.push(Endpoint {
            name: normalize_name(raw_name),
            url,
        });
    }
    endpoints
}

/// Directory names arrive with stray punctuation and carriage returns;
/// strip them so the same union always displays the same way.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | ',' | '.' | '\'' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://mortgages.example.net/default.asp?siteId=";

    #[test]
    fn parses_well_formed_lines() {
        let listing = "101>Alpha Federal C.U.\r\n202>Beta's Credit Union\n";
        let endpoints = parse_listing(listing, PREFIX);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].name, "Alpha Federal CU");
        assert_eq!(endpoints[0].url, format!("{}101", PREFIX));
        assert_eq!(endpoints[1].name, "Betas Credit Union");
    }

    #[test]
    fn skips_lines_without_separator() {
        let listing = "101>Alpha\nno separator here\n\n202>Beta";
        let endpoints = parse_listing(listing, PREFIX);
        assert_eq!(endpoints.len(), 2);
    }

    #[test]
    fn first_occurrence_wins_on_duplicate_urls() {
        let listing = "101>First Name\n101>Second Name\n202>Other";
        let endpoints = parse_listing(listing, PREFIX);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].name, "First Name");
    }

    #[test]
    fn normalization_strips_punctuation_but_not_spaces() {
        assert_eq!(normalize_name("N.W. Members', F-C-U\r"), "NW Members FCU");
        assert_eq!(normalize_name("  Plain Name  "), "Plain Name");
    }
}
