use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub questions_found: usize,
    pub complete: bool,
}

fn question_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"Q\d+\.").expect("question marker pattern is valid"))
}

/// Counts `Q<n>.` markers. Option and answer lines are not checked.
pub fn validate(raw_text: &str, requested_count: usize) -> ValidationReport {
    let questions_found = question_marker().find_iter(raw_text).count();
    ValidationReport {
        questions_found,
        complete: questions_found >= requested_count,
    }
}
