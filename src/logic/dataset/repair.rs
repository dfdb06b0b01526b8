//! Offline cleanup of a damaged feature table.
//!
//! Tables written by older collectors can lack the header row or carry
//! half-written lines. Repair keeps every row that parses into four numeric
//! fields, drops the rest, and rewrites the file with the canonical header.

use std::fs::{self, OpenOptions};
use std::io::BufReader;

use serde::Serialize;

use super::record::Reading;
use super::store::{ensure_parent_dir, open_existing, FeatureStore};
use super::StoreError;
use crate::logic::features::{FEATURE_COUNT, FEATURE_LAYOUT};

/// Outcome of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub kept: usize,
    pub dropped: usize,
    pub header_added: bool,
    pub created: bool,
}

impl FeatureStore {
    /// Rewrite the table so it has the header and only well-formed rows
    pub fn repair(&self) -> Result<RepairReport, StoreError> {
        let file = match open_existing(self.path()) {
            Ok(f) => f,
            Err(StoreError::NotFound(_)) => {
                log::info!("Feature table missing, creating {}", self.path().display());
                self.rewrite(&[])?;
                return Ok(RepairReport { created: true, ..Default::default() });
            }
            Err(e) => return Err(e),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut report = RepairReport::default();
        let mut rows = Vec::new();
        let mut first = true;

        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    log::debug!("Dropping unreadable row: {}", e);
                    report.dropped += 1;
                    continue;
                }
            };

            if record.iter().all(|field| field.is_empty()) {
                continue;
            }

            if first {
                first = false;
                if record.iter().eq(FEATURE_LAYOUT.iter().copied()) {
                    continue;
                }
                report.header_added = true;
            }

            match parse_row(&record) {
                Some(reading) => rows.push(reading),
                None => report.dropped += 1,
            }
        }

        // An empty file never had a header either
        if first {
            report.header_added = true;
        }

        report.kept = rows.len();
        self.rewrite(&rows)?;

        log::info!(
            "Repaired feature table {}: kept {}, dropped {}, header added: {}",
            self.path().display(), report.kept, report.dropped, report.header_added
        );

        Ok(report)
    }

    fn rewrite(&self, rows: &[Reading]) -> Result<(), StoreError> {
        ensure_parent_dir(self.path())?;
        let tmp_path = self.path().with_extension("csv.tmp");

        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(FEATURE_LAYOUT)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }

        fs::rename(&tmp_path, self.path())?;
        Ok(())
    }
}

fn parse_row(record: &csv::StringRecord) -> Option<Reading> {
    if record.len() != FEATURE_COUNT {
        return None;
    }

    let mut values = [0.0f64; FEATURE_COUNT];
    for (slot, field) in values.iter_mut().zip(record.iter()) {
        let value: f64 = field.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }

    Some(Reading::new(values[0], values[1], values[2], u8::from(values[3] != 0.0)))
}
