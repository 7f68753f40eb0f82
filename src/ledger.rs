use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "SKIPPED")]
    Skipped,
}

/// One line of the resume ledger. Only SUCCESS entries dated today feed the
/// resume set; everything else is history kept for diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: NaiveDateTime,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub detail: String,
}

impl LedgerEntry {
    fn now(outcome: Outcome, url: Option<String>, detail: String) -> Self {
        LedgerEntry {
            timestamp: Local::now().naive_local(),
            outcome,
            url,
            detail,
        }
    }

    pub fn info(detail: &str) -> Self {
        Self::now(Outcome::Info, None, detail.to_string())
    }

    pub fn success(url: &str, name: &str) -> Self {
        Self::now(
            Outcome::Success,
            Some(url.to_string()),
            format!("Scraped {}", name),
        )
    }

    pub fn error(url: &str, reason: &str) -> Self {
        Self::now(Outcome::Error, Some(url.to_string()), reason.to_string())
    }

    pub fn skipped(url: &str, name: &str) -> Self {
        Self::now(
            Outcome::Skipped,
            Some(url.to_string()),
            format!("Already processed {}", name),
        )
    }
}

/// Append-only run history. The file is never truncated; day rollover is
/// purely a matter of date-scoped filtering at read time.
pub struct ResumeLedger {
    writer: BufWriter<File>,
}

impl ResumeLedger {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(ResumeLedger {
            writer: BufWriter::new(file),
        })
    }

    /// Every entry hits the disk before this returns, so a kill mid-run
    /// loses at most the endpoint currently in flight.
    pub fn append(&mut self, entry: &LedgerEntry) -> io::Result<()> {
        let line = serde_json::to_string(entry)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }
}

impl Drop for ResumeLedger {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Reads every decodable entry in the ledger. A missing file is an empty
/// history; malformed lines are skipped, not fatal.
pub fn read_entries<P: AsRef<Path>>(path: P) -> io::Result<Vec<LedgerEntry>> {
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LedgerEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping malformed ledger line: {}", e),
        }
    }
    Ok(entries)
}

/// Decodes the set of URLs with a SUCCESS entry dated `day` — the resume
/// set that suppresses re-scraping for the rest of the day.
pub fn processed_on<P: AsRef<Path>>(path: P, day: NaiveDate) -> io::Result<HashSet<String>> {
    let entries = read_entries(path)?;
    Ok(entries
        .into_iter()
        .filter(|e| e.outcome == Outcome::Success && e.timestamp.date() == day)
        .filter_map(|e| e.url)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};
    use std::fs;
    use std::path::PathBuf;

    fn tmp_ledger(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rate_ledger_{}", name));
        let _ = fs::remove_file(&p);
        p
    }

    #[test]
    fn success_entries_for_today_form_the_resume_set() {
        let path = tmp_ledger("resume_set.log");
        let today = Local::now().date_naive();
        {
            let mut ledger = ResumeLedger::open(&path).unwrap();
            ledger.append(&LedgerEntry::info("run started")).unwrap();
            ledger
                .append(&LedgerEntry::success("https://a.example/1", "Alpha"))
                .unwrap();
            ledger
                .append(&LedgerEntry::error("https://a.example/2", "timed out"))
                .unwrap();
            ledger
                .append(&LedgerEntry::skipped("https://a.example/3", "Gamma"))
                .unwrap();
        }

        let processed = processed_on(&path, today).unwrap();
        assert_eq!(processed.len(), 1);
        assert!(processed.contains("https://a.example/1"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn success_entries_from_other_days_are_ignored() {
        let path = tmp_ledger("other_days.log");
        let yesterday = Local::now().naive_local() - Duration::days(1);
        let entry = LedgerEntry {
            timestamp: yesterday,
            outcome: Outcome::Success,
            url: Some("https://a.example/1".to_string()),
            detail: "Scraped Alpha".to_string(),
        };
        {
            let mut ledger = ResumeLedger::open(&path).unwrap();
            ledger.append(&entry).unwrap();
        }

        let processed = processed_on(&path, Local::now().date_naive()).unwrap();
        assert!(processed.is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_ledger_yields_empty_set() {
        let path = tmp_ledger("missing.log");
        let processed = processed_on(&path, Local::now().date_naive()).unwrap();
        assert!(processed.is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = tmp_ledger("malformed.log");
        let today = Local::now().date_naive();
        {
            let mut ledger = ResumeLedger::open(&path).unwrap();
            ledger
                .append(&LedgerEntry::success("https://a.example/1", "Alpha"))
                .unwrap();
        }
        fs::write(
            &path,
            format!(
                "{}\nnot json at all\n",
                fs::read_to_string(&path).unwrap().trim_end()
            ),
        )
        .unwrap();

        let processed = processed_on(&path, today).unwrap();
        assert_eq!(processed.len(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn entry_round_trips_through_json() {
        let entry = LedgerEntry::success("https://a.example/9", "Ninth FCU");
        let line = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back.outcome, Outcome::Success);
        assert_eq!(back.url.as_deref(), Some("https://a.example/9"));
        assert_eq!(back.timestamp.second(), entry.timestamp.second());
    }
}
