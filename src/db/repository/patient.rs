use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// A demographic row as it comes out of the CSV, before the store has
/// assigned its surrogate id. The `paths` column starts empty and is
/// populated later by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub patient_key: String,
    pub name: String,
    pub ssn: String,
    pub sex: String,
    pub birth_date: String,
    pub address: String,
}

/// A search hit: enough to render a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_key: String,
    pub name: String,
}

/// Insert patients in batches inside per-batch transactions.
///
/// `batch_size` bounds the rows buffered per transaction; the final
/// partial batch is always flushed. Returns the number of rows inserted.
pub fn insert_patients(
    conn: &mut Connection,
    records: &[NewPatient],
    batch_size: usize,
) -> Result<usize, DatabaseError> {
    let batch_size = batch_size.max(1);
    let mut inserted = 0;

    for chunk in records.chunks(batch_size) {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO patients (patient_key, name, ssn, sex, birth_date, address, paths)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, '')",
            )?;
            for record in chunk {
                stmt.execute(params![
                    record.patient_key,
                    record.name,
                    record.ssn,
                    record.sex,
                    record.birth_date,
                    record.address,
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;
    }

    Ok(inserted)
}

/// Set the joined path string for every row carrying this key.
/// Duplicate CSV identifiers all receive the same path list.
pub fn update_paths_for_key(
    conn: &Connection,
    patient_key: &str,
    joined_paths: &str,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE patients SET paths = ?1 WHERE patient_key = ?2",
        params![joined_paths, patient_key],
    )?;
    Ok(updated)
}

/// Case-insensitive substring search on patient key or name, ordered by
/// surrogate id. Empty queries are rejected upstream by the lookup
/// service; at this layer they would match everything.
pub fn search_patients(
    conn: &Connection,
    query: &str,
) -> Result<Vec<PatientSummary>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(query));
    let mut stmt = conn.prepare(
        "SELECT patient_key, name FROM patients
         WHERE patient_key LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\'
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![pattern], |row| {
            Ok(PatientSummary {
                patient_key: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Stored path string for an exact key match, or None if no record
/// carries the key. Duplicate rows share the same path string, so the
/// first is authoritative.
pub fn get_paths(conn: &Connection, patient_key: &str) -> Result<Option<String>, DatabaseError> {
    use rusqlite::OptionalExtension;
    let paths = conn
        .query_row(
            "SELECT paths FROM patients WHERE patient_key = ?1 ORDER BY id LIMIT 1",
            params![patient_key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(paths)
}

/// Every distinct patient key currently stored, in first-seen order.
pub fn distinct_patient_keys(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_key FROM patients GROUP BY patient_key ORDER BY MIN(id)",
    )?;
    let keys = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

// LIKE wildcards in user queries are literals, not patterns.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample(key: &str, name: &str) -> NewPatient {
        NewPatient {
            patient_key: key.into(),
            name: name.into(),
            ssn: "000-00-0000".into(),
            sex: "F".into(),
            birth_date: "1980-01-01".into(),
            address: "1 Main St".into(),
        }
    }

    #[test]
    fn insert_assigns_monotonic_ids() {
        let mut conn = open_memory_database().unwrap();
        let records = vec![sample("1", "A"), sample("2", "B"), sample("3", "C")];
        let n = insert_patients(&mut conn, &records, 2).unwrap();
        assert_eq!(n, 3);

        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM patients ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn partial_batch_is_flushed() {
        let mut conn = open_memory_database().unwrap();
        let records: Vec<NewPatient> =
            (0..5).map(|i| sample(&i.to_string(), "X")).collect();
        let n = insert_patients(&mut conn, &records, 2).unwrap();
        assert_eq!(n, 5);
        assert_eq!(count_patients(&conn).unwrap(), 5);
    }

    #[test]
    fn update_paths_hits_every_duplicate_row() {
        let mut conn = open_memory_database().unwrap();
        insert_patients(
            &mut conn,
            &[sample("7", "First"), sample("7", "Second"), sample("8", "Other")],
            500,
        )
        .unwrap();

        let updated = update_paths_for_key(&conn, "7", "/a.pdf;/b.pdf").unwrap();
        assert_eq!(updated, 2);
        assert_eq!(get_paths(&conn, "7").unwrap().unwrap(), "/a.pdf;/b.pdf");
        assert_eq!(get_paths(&conn, "8").unwrap().unwrap(), "");
    }

    #[test]
    fn search_matches_key_or_name_case_insensitive() {
        let mut conn = open_memory_database().unwrap();
        insert_patients(
            &mut conn,
            &[sample("42", "Doe, John"), sample("77", "Roe, Jane")],
            500,
        )
        .unwrap();

        let by_name = search_patients(&conn, "doe").unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].patient_key, "42");

        let by_key = search_patients(&conn, "7").unwrap();
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key[0].name, "Roe, Jane");
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let mut conn = open_memory_database().unwrap();
        insert_patients(&mut conn, &[sample("42", "Doe, John")], 500).unwrap();
        assert!(search_patients(&conn, "%").unwrap().is_empty());
        assert!(search_patients(&conn, "_").unwrap().is_empty());
    }

    #[test]
    fn get_paths_unknown_key_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_paths(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn distinct_keys_in_first_seen_order() {
        let mut conn = open_memory_database().unwrap();
        insert_patients(
            &mut conn,
            &[sample("9", "A"), sample("3", "B"), sample("9", "C")],
            500,
        )
        .unwrap();
        let keys = distinct_patient_keys(&conn).unwrap();
        assert_eq!(keys, vec!["9".to_string(), "3".to_string()]);
    }
}
