//! Interactive front-desk driver: run the reconciliation pipeline, then
//! answer search / open requests over stdin. Pure consumer of the
//! lookup API.

use std::io::{self, BufRead, Write};
use std::path::Path;

use chartfinder::config::{AppConfig, APP_NAME, APP_VERSION};
use chartfinder::db::repository::{record_audit, AuditAction};
use chartfinder::lookup::LookupError;
use chartfinder::open_file::{FileOpener, OpenOutcome, SystemOpener};
use chartfinder::pipeline::Pipeline;

fn main() {
    chartfinder::init_tracing();
    tracing::info!("{APP_NAME} starting v{APP_VERSION}");

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut pipeline = match Pipeline::open(config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Cannot start: {e}");
            std::process::exit(1);
        }
    };

    match pipeline.run() {
        Ok(summary) => {
            println!(
                "Indexed {} patients with files; inserted {} rows ({} skipped); {} rows linked to files.",
                summary.indexed_patients,
                summary.rows_inserted,
                summary.rows_skipped,
                summary.rows_reconciled,
            );
        }
        Err(e) => {
            eprintln!("Pipeline failed: {e}");
            std::process::exit(1);
        }
    }

    if let Err(e) = interactive_loop(&pipeline) {
        eprintln!("I/O error: {e}");
        std::process::exit(1);
    }
}

fn load_config() -> Result<AppConfig, String> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(path) => AppConfig::load(Path::new(&path)).map_err(|e| e.to_string()),
        None => Ok(AppConfig::default()),
    }
}

fn interactive_loop(pipeline: &Pipeline) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("Options:");
        println!("1. Search for patient");
        println!("2. Open patient files");
        println!("3. Exit");
        print!("Select an option: ");
        io::stdout().flush()?;

        let Some(choice) = lines.next().transpose()? else {
            return Ok(());
        };

        match choice.trim() {
            "1" => {
                print!("Enter the patient's name or ID: ");
                io::stdout().flush()?;
                let Some(query) = lines.next().transpose()? else {
                    return Ok(());
                };
                run_search(pipeline, &query);
            }
            "2" => {
                print!("Enter patient ID to open files: ");
                io::stdout().flush()?;
                let Some(key) = lines.next().transpose()? else {
                    return Ok(());
                };
                open_patient_files(pipeline, key.trim());
            }
            "3" => return Ok(()),
            _ => println!("Invalid option. Try again."),
        }
    }
}

fn run_search(pipeline: &Pipeline, query: &str) {
    let lookup = match pipeline.lookup() {
        Ok(l) => l,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    match lookup.search(query) {
        Ok(hits) if hits.is_empty() => println!("No matches."),
        Ok(hits) => {
            for hit in hits {
                println!("{}: {}", hit.patient_key, hit.name);
            }
        }
        Err(LookupError::EmptyQuery) => println!("Please enter a name or ID to search for."),
        Err(e) => println!("Search failed: {e}"),
    }
}

fn open_patient_files(pipeline: &Pipeline, patient_key: &str) {
    let lookup = match pipeline.lookup() {
        Ok(l) => l,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    let files = match lookup.get_file_paths(patient_key) {
        Ok(Some(files)) => files,
        Ok(None) => {
            println!("No patient with ID {patient_key}.");
            return;
        }
        Err(e) => {
            println!("Lookup failed: {e}");
            return;
        }
    };
    if files.is_empty() {
        println!("No files on record for patient {patient_key}.");
        return;
    }

    let opener = SystemOpener;
    for file in files {
        match opener.open(&file.path) {
            OpenOutcome::Opened => {
                println!("Opened: {}", file.path.display());
                let _ = record_audit(
                    pipeline.connection(),
                    AuditAction::Open,
                    patient_key,
                    &file.path.to_string_lossy(),
                );
            }
            OpenOutcome::MissingOnDisk => {
                println!("Missing file on disk: {}", file.path.display())
            }
            OpenOutcome::LaunchFailed(reason) => {
                println!("Could not open {}: {reason}", file.path.display())
            }
        }
    }
}
