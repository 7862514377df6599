//! Loading and normalizing candidate identifiers.
//!
//! Raw input is one candidate per line. Lines are trimmed, blank lines are
//! skipped and the required suffix is appended when missing. Input order is
//! preserved and duplicates are passed through untouched.

use crate::error::HuntError;
use crate::types::Identifier;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Normalize a single raw candidate.
///
/// Returns `None` for blank input.
pub fn normalize_identifier(raw: &str, suffix: &str) -> Option<Identifier> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(Identifier::qualified(trimmed, suffix))
}

/// Normalize every line of `reader`.
///
/// # Errors
///
/// Returns `HuntError::FileError` if reading fails and `HuntError::NoInput`
/// if no identifiers remain after normalization.
pub fn load_identifiers<R: BufRead>(
    reader: R,
    suffix: &str,
    source: &str,
) -> Result<Vec<Identifier>, HuntError> {
    let mut identifiers = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| HuntError::file_error(source, e.to_string()))?;
        if let Some(identifier) = normalize_identifier(&line, suffix) {
            identifiers.push(identifier);
        }
    }

    if identifiers.is_empty() {
        return Err(HuntError::no_input(source));
    }

    tracing::debug!(count = identifiers.len(), source, "loaded identifiers");
    Ok(identifiers)
}

/// Normalize every line of the file at `path`.
pub fn load_identifiers_from_file<P: AsRef<Path>>(
    path: P,
    suffix: &str,
) -> Result<Vec<Identifier>, HuntError> {
    let path = path.as_ref();
    let display = path.to_string_lossy();

    let file = File::open(path).map_err(|e| {
        HuntError::file_error(display.as_ref(), format!("Failed to open input file: {}", e))
    })?;

    load_identifiers(BufReader::new(file), suffix, display.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn names(ids: &[Identifier]) -> Vec<&str> {
        ids.iter().map(Identifier::as_str).collect()
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(
            normalize_identifier("  alice ", ".eth").map(|i| i.to_string()),
            Some("alice.eth".to_string())
        );
        assert!(normalize_identifier("   ", ".eth").is_none());
        assert!(normalize_identifier("", ".eth").is_none());
    }

    #[test]
    fn test_load_skips_blank_and_qualifies() {
        let input = Cursor::new("alice\nbob.eth\n\n  \n");
        let ids = load_identifiers(input, ".eth", "test").unwrap();
        assert_eq!(names(&ids), vec!["alice.eth", "bob.eth"]);
    }

    #[test]
    fn test_load_count_matches_non_blank_lines() {
        let lines = ["a", " ", "b", "c.eth", "\t", "d ", ""];
        let input = Cursor::new(lines.join("\n"));
        let ids = load_identifiers(input, ".eth", "test").unwrap();

        let non_blank = lines.iter().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(ids.len(), non_blank);
        assert!(ids.iter().all(|id| id.as_str().ends_with(".eth")));
    }

    #[test]
    fn test_load_keeps_duplicates_in_order() {
        let input = Cursor::new("zed\nalice\nzed.eth\n");
        let ids = load_identifiers(input, ".eth", "test").unwrap();
        assert_eq!(names(&ids), vec!["zed.eth", "alice.eth", "zed.eth"]);
    }

    #[test]
    fn test_load_empty_input_is_error() {
        let input = Cursor::new("\n   \n\n");
        let err = load_identifiers(input, ".eth", "names.txt").unwrap_err();
        assert!(matches!(err, HuntError::NoInput { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "vitalik\n\nnick.eth").unwrap();
        file.flush().unwrap();

        let ids = load_identifiers_from_file(file.path(), ".eth").unwrap();
        assert_eq!(names(&ids), vec!["vitalik.eth", "nick.eth"]);
    }

    #[test]
    fn test_load_missing_file_is_file_error() {
        let err = load_identifiers_from_file("/definitely/not/here.txt", ".eth").unwrap_err();
        assert!(matches!(err, HuntError::FileError { .. }));
    }
}
