//! Lookup service — the query surface consumed by the presentation layer.

use std::path::PathBuf;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repository::{self, PatientSummary};
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Search query must not be empty")]
    EmptyQuery,

    #[error("Store is not ready: run the reconciliation pipeline first")]
    NotReady,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// One document path with its existence annotated at query time. A path
/// going stale between reconciliation runs is reported, not raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFile {
    pub path: PathBuf,
    pub exists: bool,
}

/// Read-only query API over a reconciled store.
pub struct LookupService<'a> {
    conn: &'a Connection,
    delimiter: String,
}

impl<'a> LookupService<'a> {
    pub fn new(conn: &'a Connection, delimiter: impl Into<String>) -> Self {
        LookupService {
            conn,
            delimiter: delimiter.into(),
        }
    }

    /// Substring search on patient key or name.
    ///
    /// An empty or whitespace-only query is a validation error; zero
    /// matches is a successful empty result.
    pub fn search(&self, query: &str) -> Result<Vec<PatientSummary>, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }
        Ok(repository::search_patients(self.conn, query)?)
    }

    /// The document paths stored for an exact key, split out of the
    /// delimited string and annotated with on-disk existence. `None`
    /// when no record carries the key; an empty vec when the record has
    /// no files associated.
    pub fn get_file_paths(&self, patient_key: &str) -> Result<Option<Vec<PatientFile>>, LookupError> {
        let Some(joined) = repository::get_paths(self.conn, patient_key)? else {
            return Ok(None);
        };

        let files = joined
            .split(&self.delimiter)
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                let path = PathBuf::from(s.trim());
                let exists = path.exists();
                PatientFile { path, exists }
            })
            .collect();
        Ok(Some(files))
    }
}
