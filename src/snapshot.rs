use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use log::info;

use crate::rates::EndpointRecord;

/// In-memory view of the persisted dataset, keyed by URL so a URL can never
/// occupy two rows.
pub type Dataset = BTreeMap<String, EndpointRecord>;

/// Seeds the dataset from the snapshot CSV, but only when the file was last
/// written today. Any other day means a fresh dataset; yesterday's rows are
/// never merged in.
pub fn load<P: AsRef<Path>>(path: P, today: NaiveDate) -> Result<Dataset, csv::Error> {
    let path = path.as_ref();
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Dataset::new()),
        Err(e) => return Err(e.into()),
    };

    let modified: DateTime<Local> = meta.modified()?.into();
    if modified.date_naive() != today {
        info!(
            "Snapshot {} is from {}, starting a fresh dataset",
            path.display(),
            modified.date_naive()
        );
        return Ok(Dataset::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut dataset = Dataset::new();
    for row in reader.deserialize() {
        let record: EndpointRecord = row?;
        dataset.insert(record.url.clone(), record);
    }
    info!("Resumed {} rows from today's snapshot", dataset.len());
    Ok(dataset)
}

/// Rewrites the whole snapshot. Goes through a sibling temp file and an
/// atomic rename so a crash mid-write leaves the previous snapshot intact.
pub fn save<P: AsRef<Path>>(path: P, dataset: &Dataset) -> Result<(), csv::Error> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("csv.tmp");

    let mut writer = csv::Writer::from_path(&tmp_path)?;
    for record in dataset.values() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp_path, path).map_err(csv::Error::from)
}
