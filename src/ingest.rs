//! CSV ingestor — streams demographic rows into the record store.

use std::fs::File;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use rusqlite::Connection;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::repository::{self, AuditAction, NewPatient};
use crate::db::DatabaseError;
use crate::keys::normalize_key;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Cannot open CSV file {path}: {source}")]
    Open {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Column positions of the required demographic fields, resolved once
/// from the header row.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    id: usize,
    name: usize,
    ssn: usize,
    sex: usize,
    birth_date: usize,
    address: usize,
}

impl FieldMapping {
    const REQUIRED: [&'static str; 6] =
        ["ID", "Patient Name", "SSN", "Sex", "Birth Date", "Address"];

    /// Resolve the required columns from a header record. Tolerates a
    /// UTF-8 byte-order mark on the first header cell and undecodable
    /// bytes anywhere (decoded lossily).
    pub fn from_headers(headers: &ByteRecord) -> Result<Self, IngestError> {
        let names: Vec<String> = headers
            .iter()
            .map(|cell| {
                String::from_utf8_lossy(cell)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();

        let position = |wanted: &'static str| -> Result<usize, IngestError> {
            names
                .iter()
                .position(|n| n == wanted)
                .ok_or(IngestError::MissingColumn(wanted))
        };

        Ok(FieldMapping {
            id: position(Self::REQUIRED[0])?,
            name: position(Self::REQUIRED[1])?,
            ssn: position(Self::REQUIRED[2])?,
            sex: position(Self::REQUIRED[3])?,
            birth_date: position(Self::REQUIRED[4])?,
            address: position(Self::REQUIRED[5])?,
        })
    }

    /// Turn one data record into a storable patient, or None when a
    /// required field is absent from the row.
    fn to_patient(&self, record: &ByteRecord) -> Option<NewPatient> {
        let field = |idx: usize| -> Option<String> {
            record
                .get(idx)
                .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
        };

        Some(NewPatient {
            patient_key: normalize_key(&field(self.id)?),
            name: field(self.name)?,
            ssn: field(self.ssn)?,
            sex: field(self.sex)?,
            birth_date: field(self.birth_date)?,
            address: field(self.address)?,
        })
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Stream the configured CSV into the store.
///
/// Rows are buffered up to `config.batch_size` and inserted per batch;
/// the file is never held in memory whole. A row missing a required
/// field (or unparsable as CSV) is logged and skipped; a missing file
/// is fatal. Every record starts with an empty path string.
pub fn ingest(conn: &mut Connection, config: &AppConfig) -> Result<IngestReport, IngestError> {
    ingest_from(conn, &config.csv_path, config.batch_size)
}

pub fn ingest_from(
    conn: &mut Connection,
    csv_path: &Path,
    batch_size: usize,
) -> Result<IngestReport, IngestError> {
    tracing::info!(csv = %csv_path.display(), "Starting ingestion");

    let file = File::open(csv_path).map_err(|e| IngestError::Open {
        path: csv_path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let mapping = FieldMapping::from_headers(reader.byte_headers()?)?;

    let mut batch: Vec<NewPatient> = Vec::with_capacity(batch_size.max(1));
    let mut inserted = 0usize;
    let mut skipped = 0usize;
    let mut record = ByteRecord::new();

    loop {
        match reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(err) if err.is_io_error() => return Err(IngestError::Csv(err)),
            Err(err) => {
                tracing::warn!(line = record.position().map_or(0, |p| p.line()), error = %err, "Skipping malformed CSV row");
                skipped += 1;
                continue;
            }
        }

        match mapping.to_patient(&record) {
            Some(patient) => batch.push(patient),
            None => {
                tracing::warn!(
                    line = record.position().map_or(0, |p| p.line()),
                    "Skipping row with missing required field"
                );
                skipped += 1;
                continue;
            }
        }

        if batch.len() >= batch_size.max(1) {
            inserted += repository::insert_patients(conn, &batch, batch_size)?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        inserted += repository::insert_patients(conn, &batch, batch_size)?;
    }

    repository::record_audit(
        conn,
        AuditAction::Ingest,
        "",
        &format!("inserted {inserted} rows, skipped {skipped}"),
    )?;
    tracing::info!(inserted, skipped, "Ingestion complete");

    Ok(IngestReport { inserted, skipped })
}
