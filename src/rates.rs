use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel used wherever a site yielded no parseable rate table.
pub const NO_RATES: &str = "None";

/// One parsed (loan program, rate) pair from a fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub loan_type: String,
    pub rate_text: String,
    pub numeric_rate: Option<f64>,
}

impl RateQuote {
    pub fn new(loan_type: &str, rate_text: &str) -> Self {
        RateQuote {
            loan_type: loan_type.to_string(),
            rate_text: rate_text.to_string(),
            numeric_rate: parse_numeric_rate(rate_text),
        }
    }

    /// The `<loanType>-<rateText>` form used both in the serialized rate
    /// list and as the best-rate label.
    pub fn label(&self) -> String {
        format!("{}-{}", self.loan_type, self.rate_text)
    }
}

/// Rates only count as numeric when the site printed them as a percentage.
fn parse_numeric_rate(rate_text: &str) -> Option<f64> {
    let trimmed = rate_text.trim();
    if !trimmed.ends_with('%') {
        return None;
    }
    trimmed.trim_end_matches('%').trim().parse::<f64>().ok()
}

/// Joins quotes into the pipe-delimited on-disk form, or the sentinel when
/// the page had no rate tables.
pub fn serialize_quotes(quotes: &[RateQuote]) -> String {
    if quotes.is_empty() {
        return NO_RATES.to_string();
    }
    quotes
        .iter()
        .map(|q| q.label())
        .collect::<Vec<_>>()
        .join("|")
}

/// Decodes the pipe-delimited form back into quotes. Loan types may contain
/// dashes ("30-Year Fixed"), so the rate text is whatever follows the LAST
/// dash; entries without any dash are skipped.
pub fn parse_quotes(serialized: &str) -> Vec<RateQuote> {
    if serialized.trim().is_empty() || serialized == NO_RATES {
        return Vec::new();
    }
    serialized
        .split('|')
        .filter_map(|entry| {
            let (loan_type, rate_text) = entry.rsplit_once('-')?;
            Some(RateQuote::new(loan_type, rate_text))
        })
        .collect()
}

/// Which quote a record advertises as its headline rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestRatePolicy {
    /// Lowest numeric rate across every parsed program.
    LowestOverall,
    /// Lowest numeric rate among 30-year programs only.
    LowestThirtyYear,
}

impl BestRatePolicy {
    pub fn select<'a>(&self, quotes: &'a [RateQuote]) -> Option<&'a RateQuote> {
        let thirty_year = thirty_year_regex();
        quotes
            .iter()
            .filter(|q| q.numeric_rate.is_some())
            .filter(|q| match self {
                BestRatePolicy::LowestOverall => true,
                BestRatePolicy::LowestThirtyYear => thirty_year.is_match(&q.loan_type),
            })
            .min_by(|a, b| {
                a.numeric_rate
                    .partial_cmp(&b.numeric_rate)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    pub fn best_label(&self, quotes: &[RateQuote]) -> String {
        self.select(quotes)
            .map(|q| q.label())
            .unwrap_or_else(|| NO_RATES.to_string())
    }
}

fn thirty_year_regex() -> Regex {
    // Sites print the term as "30 Year", "30-Year" or "30 Yr".
    Regex::new(r"(?i)\b30[\s-]?(year|yr)").unwrap()
}

/// The persisted, merged result for one endpoint. One CSV row per URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    #[serde(rename = "credit_union")]
    pub name: String,
    #[serde(rename = "link")]
    pub url: String,
    pub rates: String,
    pub best_rate: String,
}

impl EndpointRecord {
    pub fn from_quotes(name: &str, url: &str, quotes: &[RateQuote], policy: BestRatePolicy) -> Self {
        EndpointRecord {
            name: name.to_string(),
            url: url.to_string(),
            rates: serialize_quotes(quotes),
            best_rate: policy.best_label(quotes),
        }
    }

    pub fn quotes(&self) -> Vec<RateQuote> {
        parse_quotes(&self.rates)
    }
}
