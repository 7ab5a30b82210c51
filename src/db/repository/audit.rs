use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Action tags recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuditAction {
    Ingest,
    Reconcile,
    Open,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Reconcile => "reconcile",
            Self::Open => "open",
        }
    }
}

/// Append one entry to the audit trail. Write-only from the core's
/// perspective; external tooling reads it back.
pub fn record_audit(
    conn: &Connection,
    action: AuditAction,
    patient_key: &str,
    detail: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (timestamp, action, patient_key, detail)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            Utc::now().to_rfc3339(),
            action.as_str(),
            patient_key,
            detail,
        ],
    )?;
    Ok(())
}
