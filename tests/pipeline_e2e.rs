//! End-to-end pipeline runs over a real temp directory and SQLite file.

use std::fs;
use std::path::Path;

use chartfinder::config::AppConfig;
use chartfinder::pipeline::Pipeline;

const HEADER: &str = "ID,Patient Name,SSN,Sex,Birth Date,Address\n";

struct Fixture {
    _dir: tempfile::TempDir,
    config: AppConfig,
}

fn fixture(csv_rows: &str, docs: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("PatientData");
    let nested = root.join("2024");
    fs::create_dir_all(&nested).unwrap();
    for doc in docs {
        fs::write(root.join(doc), b"%PDF-1.4").unwrap();
    }
    let csv_path = dir.path().join("patients.csv");
    fs::write(&csv_path, format!("{HEADER}{csv_rows}")).unwrap();

    let config = AppConfig {
        root_dirs: vec![root],
        csv_path,
        db_path: dir.path().join("patients.db"),
        ..AppConfig::default()
    };
    Fixture { _dir: dir, config }
}

#[test]
fn csv_row_meets_scanned_file() {
    let fx = fixture(
        "0042,\"Doe, John\",123-45-6789,M,1970-01-01,1 Main St\n",
        &["42_facesheet.pdf"],
    );
    let mut pipeline = Pipeline::open(fx.config.clone()).unwrap();
    pipeline.run().unwrap();
    let lookup = pipeline.lookup().unwrap();

    let hits = lookup.search("Doe").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].patient_key, "42");
    assert_eq!(hits[0].name, "Doe, John");

    let files = lookup.get_file_paths("42").unwrap().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with(Path::new("42_facesheet.pdf")));
    assert!(files[0].exists);
}

#[test]
fn duplicate_csv_identifiers_share_the_path_string() {
    let fx = fixture(
        "7,\"First, Pat\",x,M,1970-01-01,A\n7,\"Second, Pat\",x,F,1980-01-01,B\n",
        &["7_facesheet.pdf", "7_labs.pdf"],
    );
    let mut pipeline = Pipeline::open(fx.config.clone()).unwrap();
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.rows_inserted, 2);
    assert_eq!(summary.rows_reconciled, 2);

    let paths: Vec<String> = pipeline
        .connection()
        .prepare("SELECT paths FROM patients WHERE patient_key = '7' ORDER BY id")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0], paths[1]);
    assert_eq!(paths[0].split(';').count(), 2);
}

#[test]
fn file_without_underscore_indexed_under_stem() {
    let fx = fixture("99,\"Stone, Avery\",x,F,1960-05-05,X\n", &["99.pdf"]);
    let mut pipeline = Pipeline::open(fx.config.clone()).unwrap();
    pipeline.run().unwrap();

    let files = pipeline
        .lookup()
        .unwrap()
        .get_file_paths("99")
        .unwrap()
        .unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with(Path::new("99.pdf")));
}

#[test]
fn unmatched_key_keeps_empty_paths() {
    let fx = fixture("12,\"NoDocs, Sam\",x,M,1950-06-06,Y\n", &["42_other.pdf"]);
    let mut pipeline = Pipeline::open(fx.config.clone()).unwrap();
    pipeline.run().unwrap();

    let files = pipeline
        .lookup()
        .unwrap()
        .get_file_paths("12")
        .unwrap()
        .unwrap();
    assert!(files.is_empty());
}

#[test]
fn rebuild_is_deterministic() {
    let rows = "0042,\"Doe, John\",x,M,1970-01-01,A\n7,\"Roe, Jane\",x,F,1980-01-01,B\n";
    let docs = ["42_facesheet.pdf", "42_labs.pdf", "7_notes.xml"];

    let fx = fixture(rows, &docs);
    let mut first_cfg = fx.config.clone();
    first_cfg.reset_store = true;
    let mut pipeline = Pipeline::open(first_cfg.clone()).unwrap();
    pipeline.run().unwrap();
    let first = path_strings(&pipeline);
    drop(pipeline);

    let mut pipeline = Pipeline::open(first_cfg).unwrap();
    pipeline.run().unwrap();
    let second = path_strings(&pipeline);

    assert_eq!(first, second);
}

fn path_strings(pipeline: &Pipeline) -> Vec<(String, String)> {
    pipeline
        .connection()
        .prepare("SELECT patient_key, paths FROM patients ORDER BY patient_key")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn audit_trail_records_ingest_and_reconcile() {
    let fx = fixture("1,\"A, B\",x,M,1970-01-01,Z\n", &["1_doc.pdf"]);
    let mut pipeline = Pipeline::open(fx.config.clone()).unwrap();
    pipeline.run().unwrap();

    let actions: Vec<String> = pipeline
        .connection()
        .prepare("SELECT action FROM audit_log ORDER BY id")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(actions, vec!["ingest".to_string(), "reconcile".to_string()]);
}
