//! Path reconciler — joins the file index into the record store.

use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{self, AuditAction};
use crate::db::DatabaseError;
use crate::index::FileIndex;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// For every distinct patient key in the store, write the index's path
/// list (joined with `delimiter`) into the matching rows.
///
/// Keys with no index entry are left untouched, so re-running against a
/// shrunken index never erases a previously reconciled path. Re-running
/// against a grown index overwrites matched keys with the latest list.
/// Returns the number of rows updated.
pub fn reconcile(
    conn: &Connection,
    file_index: &FileIndex,
    delimiter: &str,
) -> Result<usize, ReconcileError> {
    let keys = repository::distinct_patient_keys(conn)?;
    let mut rows_updated = 0usize;
    let mut keys_matched = 0usize;

    for key in &keys {
        let Some(paths) = file_index.get(key) else {
            continue;
        };
        let joined = paths
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(delimiter);
        rows_updated += repository::update_paths_for_key(conn, key, &joined)?;
        keys_matched += 1;
    }

    repository::record_audit(
        conn,
        AuditAction::Reconcile,
        "",
        &format!("matched {keys_matched} of {} keys, updated {rows_updated} rows", keys.len()),
    )?;
    tracing::info!(keys_matched, rows_updated, "Reconciliation complete");

    Ok(rows_updated)
}
