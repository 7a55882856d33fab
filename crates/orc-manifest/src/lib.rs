//! # orc-manifest
//!
//! Parses the FILE-block textual format the Implementer/Tester roles emit
//! into an ordered set of [`ManifestEntry`] values, per §4.2 and §6's
//! "FILE manifest format".
//!
//! The parser is a small explicit state machine (`scanning` /
//! `in_file_block`) rather than regex-driven prose parsing, per the
//! re-architecture guidance in the design notes.

mod entry;
mod path_safety;
mod state_machine;

pub use entry::{FileOperation, ManifestEntry};
pub use path_safety::{normalize_and_validate as path_safety_normalize, PathSafetyError};

use orc_types::{ErrorKind, OrcError};

/// Parses `input` as a FILE-block manifest.
///
/// In `strict` mode, any non-empty line outside a FILE block is an error.
/// In non-strict mode, such lines are discarded as prose. Duplicate paths
/// and unsafe paths are always rejected, in either mode.
pub fn parse(input: &str, strict: bool) -> Result<Vec<ManifestEntry>, OrcError> {
    let blocks = state_machine::scan(input, strict)
        .map_err(|e| OrcError::new(ErrorKind::ParseError, e.to_string()))?;

    let mut seen = std::collections::BTreeSet::new();
    let mut entries = Vec::with_capacity(blocks.len());
    for block in blocks {
        let normalized = path_safety::normalize_and_validate(&block.path)
            .map_err(|e| OrcError::new(ErrorKind::ParseError, e.to_string()).with_detail(block.path.clone()))?;

        if !seen.insert(normalized.clone()) {
            return Err(OrcError::new(
                ErrorKind::ParseError,
                format!("duplicate path in manifest: {normalized}"),
            ));
        }

        entries.push(ManifestEntry {
            path: normalized,
            content: normalize_trailing_newline(&block.content),
            operation: FileOperation::infer(&block.content),
            language: None,
        });
    }

    Ok(entries)
}

/// Collapses any trailing run of newlines to exactly one, per §4.2: "a
/// trailing newline is normalized to exactly one." Interior trailing
/// whitespace on each line is left untouched.
fn normalize_trailing_newline(body: &str) -> String {
    let trimmed = body.trim_end_matches('\n');
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_file_blocks_in_order() {
        let input = "FILE: main.py\nprint(1)\nFILE: requirements.txt\nfastapi\n";
        let entries = parse(input, true).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "main.py");
        assert_eq!(entries[1].path, "requirements.txt");
    }

    #[test]
    fn strict_mode_rejects_stray_prose() {
        let input = "Here is your code:\nFILE: main.py\nprint(1)\n";
        assert!(parse(input, true).is_err());
    }

    #[test]
    fn non_strict_mode_discards_stray_prose() {
        let input = "Here is your code:\nFILE: main.py\nprint(1)\n";
        let entries = parse(input, false).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let input = "FILE: main.py\na\nFILE: main.py\nb\n";
        assert!(parse(input, true).is_err());
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let input = "FILE: ../../etc/passwd\nroot:x:0:0\n";
        assert!(parse(input, true).is_err());
    }

    #[test]
    fn absolute_paths_are_rejected() {
        let input = "FILE: /etc/shadow\nx\n";
        assert!(parse(input, true).is_err());
    }

    #[test]
    fn trailing_blank_lines_collapse_to_one_newline() {
        let input = "FILE: a.txt\nhello\n\n\n";
        let entries = parse(input, true).unwrap();
        assert_eq!(entries[0].content, "hello\n");
    }

    #[test]
    fn round_trip_reparse_yields_same_entries() {
        let input = "FILE: a.py\nprint('a')\nFILE: b.py\nprint('b')\n";
        let once = parse(input, true).unwrap();
        let rendered: String = once
            .iter()
            .map(|e| format!("FILE: {}\n{}", e.path, e.content))
            .collect();
        let twice = parse(&rendered, true).unwrap();
        let paths_once: Vec<_> = once.iter().map(|e| e.path.clone()).collect();
        let paths_twice: Vec<_> = twice.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths_once, paths_twice);
    }
}
