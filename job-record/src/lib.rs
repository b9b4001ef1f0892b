//! Per-release timing records and the `record.csv` report.
//!
//! The JobRecord matrix is written only by its owning service's thread and
//! printed only after all threads join (spec.md §5); this crate provides the
//! record type and a `csv`-backed writer (the pack establishes `csv` as the
//! house crate for tabular output, e.g. `flytrax-csv-to-braidz`).

use std::path::Path;

use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum JobRecordError {
    #[error("writing {path}: {source}")]
    Write { path: String, source: csv::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceId {
    Seq,
    S1,
    S2,
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceId::Seq => "Seq",
            ServiceId::S1 => "S1",
            ServiceId::S2 => "S2",
        };
        f.write_str(s)
    }
}

/// One row of `record.csv`: `Service, Count, StartTime, EndTime, C, T, D`.
/// Times are milliseconds since the run start.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Count")]
    pub cycle: u64,
    #[serde(rename = "StartTime")]
    pub start_ms: i64,
    #[serde(rename = "EndTime")]
    pub end_ms: i64,
    #[serde(rename = "C")]
    pub c_ms: i64,
    #[serde(rename = "T")]
    pub t_ms: i64,
    #[serde(rename = "D")]
    pub d_ms: i64,
}

impl JobRecord {
    pub fn new(service: ServiceId, cycle: u64, start_ms: i64, end_ms: i64, t_ms: i64) -> Self {
        Self {
            service: service.to_string(),
            cycle,
            start_ms,
            end_ms,
            c_ms: end_ms - start_ms,
            t_ms,
            d_ms: start_ms + t_ms,
        }
    }

    /// `true` if this release's observed execution time exceeded its period.
    pub fn missed_deadline(&self) -> bool {
        self.c_ms > self.t_ms
    }
}

/// An in-memory append-only log of `JobRecord`s, flushed to CSV at shutdown.
#[derive(Debug, Default)]
pub struct JobRecordLog {
    records: Vec<JobRecord>,
}

impl JobRecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: JobRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), JobRecordError> {
        let path = path.as_ref();
        let mut wtr = csv::Writer::from_path(path).map_err(|source| JobRecordError::Write {
            path: path.display().to_string(),
            source,
        })?;
        for record in &self.records {
            wtr.serialize(record).map_err(|source| JobRecordError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        wtr.flush().map_err(|e| JobRecordError::Write {
            path: path.display().to_string(),
            source: csv::Error::from(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missed_deadline_is_c_greater_than_t() {
        let r = JobRecord::new(ServiceId::S1, 0, 0, 150, 100);
        assert!(r.missed_deadline());
        let r2 = JobRecord::new(ServiceId::S1, 1, 0, 50, 100);
        assert!(!r2.missed_deadline());
    }

    #[test]
    fn write_csv_has_expected_header() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut log = JobRecordLog::new();
        log.push(JobRecord::new(ServiceId::Seq, 0, 0, 5, 1000));
        log.write_csv(tmp.path()).unwrap();
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "Service,Count,StartTime,EndTime,C,T,D");
    }
}
