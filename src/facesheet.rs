//! Best-effort facesheet metadata hints.
//!
//! Extraction is regex-based over whatever text a collaborator pulls
//! out of the first page of a document. Hints are a secondary signal
//! for staff to eyeball against a search result; the filename-derived
//! patient key stays the only join key.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Supplies first-page text for a document. PDF parsing itself lives
/// outside the core; tests and callers plug in their own source.
pub trait PageTextSource {
    fn first_page_text(&self, path: &Path) -> Option<String>;
}

/// Whatever could be read off a facesheet. All fields empty when the
/// document has no text or none of the patterns match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacesheetHints {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub dob: Option<String>,
}

impl FacesheetHints {
    pub fn is_empty(&self) -> bool {
        self.patient_id.is_none() && self.patient_name.is_none() && self.dob.is_none()
    }
}

fn mrn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"MRN:\s*(\d+)").unwrap())
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Name:\s*([A-Z,\- ]+)").unwrap())
}

fn dob_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"DOB:\s*([\d/]+)").unwrap())
}

/// Pull MRN / Name / DOB hints out of facesheet text.
pub fn extract_hints(text: &str) -> FacesheetHints {
    FacesheetHints {
        patient_id: mrn_regex()
            .captures(text)
            .map(|c| c[1].to_string()),
        patient_name: name_regex()
            .captures(text)
            .map(|c| c[1].trim().to_string()),
        dob: dob_regex().captures(text).map(|c| c[1].to_string()),
    }
}

/// Convenience over a text source; empty hints when the source yields
/// nothing for the path.
pub fn hints_for(source: &dyn PageTextSource, path: &Path) -> FacesheetHints {
    match source.first_page_text(path) {
        Some(text) => extract_hints(&text),
        None => FacesheetHints::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_three_fields() {
        let text = "ACME HOSPITAL\nMRN: 004217\nName: DOE, JOHN\nDOB: 01/02/1970\n";
        let hints = extract_hints(text);
        assert_eq!(hints.patient_id.as_deref(), Some("004217"));
        assert_eq!(hints.patient_name.as_deref(), Some("DOE, JOHN"));
        assert_eq!(hints.dob.as_deref(), Some("01/02/1970"));
    }

    #[test]
    fn partial_text_gives_partial_hints() {
        let hints = extract_hints("MRN: 55\nsome unrelated text");
        assert_eq!(hints.patient_id.as_deref(), Some("55"));
        assert!(hints.patient_name.is_none());
        assert!(hints.dob.is_none());
    }

    #[test]
    fn no_text_no_hints() {
        assert!(extract_hints("").is_empty());
        assert!(extract_hints("nothing matching here").is_empty());
    }

    #[test]
    fn source_returning_none_yields_empty_hints() {
        struct NoText;
        impl PageTextSource for NoText {
            fn first_page_text(&self, _path: &Path) -> Option<String> {
                None
            }
        }
        let hints = hints_for(&NoText, Path::new("/scans/42_facesheet.pdf"));
        assert!(hints.is_empty());
    }
}
