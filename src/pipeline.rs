//! Pipeline run state — enforces the build → ingest → reconcile → serve
//! ordering that the original driver only implied by call order.

use std::path::PathBuf;
use std::time::Instant;

use rusqlite::Connection;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};
use crate::index::{build_file_index, FileIndex};
use crate::ingest::{self, IngestError, IngestReport};
use crate::lookup::{LookupError, LookupService};
use crate::reconcile::{self, ReconcileError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("CSV file not found: {0}")]
    CsvMissing(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),
}

/// Where a run currently stands. Lookups are only served at `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Empty,
    Indexed,
    Ingested,
    Reconciled,
    Ready,
}

/// Totals reported after a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub indexed_patients: usize,
    pub rows_inserted: usize,
    pub rows_skipped: usize,
    pub rows_reconciled: usize,
}

/// One reconciliation run over one store. Owns the connection for the
/// whole run so it is closed on every exit path.
#[derive(Debug)]
pub struct Pipeline {
    config: AppConfig,
    conn: Connection,
    state: PipelineState,
    index: Option<FileIndex>,
}

impl Pipeline {
    /// Open the store for a run.
    ///
    /// The CSV's existence is checked before any destructive reset so a
    /// misconfigured run fails while the previous complete store is
    /// still intact. The schema reset itself only happens when
    /// `config.reset_store` is set.
    pub fn open(config: AppConfig) -> Result<Self, PipelineError> {
        if !config.csv_path.exists() {
            return Err(PipelineError::CsvMissing(config.csv_path.clone()));
        }

        let conn = db::open_database(&config.db_path)?;
        if config.reset_store {
            db::reset_schema(&conn)?;
        }

        Ok(Pipeline {
            config,
            conn,
            state: PipelineState::Empty,
            index: None,
        })
    }

    /// Test constructor over an already-open connection.
    #[cfg(test)]
    pub fn with_connection(config: AppConfig, conn: Connection) -> Self {
        Pipeline {
            config,
            conn,
            state: PipelineState::Empty,
            index: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run all stages in order. Single-threaded and synchronous: each
    /// stage completes before the next starts, and only a completed run
    /// transitions to `Ready`.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let index = self.build_index();
        let report = self.ingest()?;
        let rows_reconciled = self.reconcile()?;
        self.state = PipelineState::Ready;

        Ok(RunSummary {
            indexed_patients: index,
            rows_inserted: report.inserted,
            rows_skipped: report.skipped,
            rows_reconciled,
        })
    }

    /// The query surface. Rejected until a run has completed.
    pub fn lookup(&self) -> Result<LookupService<'_>, LookupError> {
        if self.state != PipelineState::Ready {
            return Err(LookupError::NotReady);
        }
        Ok(LookupService::new(&self.conn, self.config.path_delimiter.clone()))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn build_index(&mut self) -> usize {
        let started = Instant::now();
        let index = build_file_index(&self.config);
        let patients = index.len();
        tracing::info!(patients, elapsed = ?started.elapsed(), "Index stage done");
        self.index = Some(index);
        self.state = PipelineState::Indexed;
        patients
    }

    fn ingest(&mut self) -> Result<IngestReport, PipelineError> {
        let started = Instant::now();
        let report = ingest::ingest(&mut self.conn, &self.config)?;
        tracing::info!(
            inserted = report.inserted,
            skipped = report.skipped,
            elapsed = ?started.elapsed(),
            "Ingest stage done"
        );
        self.state = PipelineState::Ingested;
        Ok(report)
    }

    fn reconcile(&mut self) -> Result<usize, PipelineError> {
        let started = Instant::now();
        // run() always indexes first; an empty index is still valid.
        let index = self.index.take().unwrap_or_default();
        let updated = reconcile::reconcile(&self.conn, &index, &self.config.path_delimiter)?;
        tracing::info!(updated, elapsed = ?started.elapsed(), "Reconcile stage done");
        self.index = Some(index);
        self.state = PipelineState::Reconciled;
        Ok(updated)
    }
}
