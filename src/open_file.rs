//! File-open delegate — hands a document path to the host's default
//! handler. External to the reconciliation core; the lookup service
//! already reports whether a path still exists.

use std::path::Path;

/// Outcome of asking the host to open one path.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened,
    MissingOnDisk,
    LaunchFailed(String),
}

pub trait FileOpener {
    fn open(&self, path: &Path) -> OpenOutcome;
}

/// Opens files with the platform's default application.
pub struct SystemOpener;

impl FileOpener for SystemOpener {
    fn open(&self, path: &Path) -> OpenOutcome {
        if !path.exists() {
            return OpenOutcome::MissingOnDisk;
        }
        match launch(path) {
            Ok(()) => OpenOutcome::Opened,
            Err(e) => OpenOutcome::LaunchFailed(e.to_string()),
        }
    }
}

#[cfg(target_os = "windows")]
fn launch(path: &Path) -> std::io::Result<()> {
    std::process::Command::new("cmd")
        .args(["/C", "start", ""])
        .arg(path)
        .spawn()
        .map(|_| ())
}

#[cfg(target_os = "macos")]
fn launch(path: &Path) -> std::io::Result<()> {
    std::process::Command::new("open").arg(path).spawn().map(|_| ())
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launch(path: &Path) -> std::io::Result<()> {
    std::process::Command::new("xdg-open").arg(path).spawn().map(|_| ())
}
