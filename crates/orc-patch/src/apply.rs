use crate::diff::{DiffLine, DiffPatch, Hunk};

/// Line drift allowed when locating a hunk's anchor before it's declared a
/// failure (§4.4: "drift window of ±N lines, N=3 by default").
pub const DRIFT_WINDOW: i64 = 3;

/// Drift above this many lines still applies, but is recorded as a warning.
pub const DRIFT_WARNING_THRESHOLD: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    ContextMismatch { hunk_index: usize },
}

/// The result of successfully applying every hunk in one file's patch.
pub struct ApplyOutcome {
    pub new_content: String,
    pub drift_warnings: Vec<DriftWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftWarning {
    pub hunk_index: usize,
    pub drift: i64,
}

/// Applies every hunk in `patch` to `original`, in order, rewriting an
/// in-memory copy of the file (step 4 of §4.4's algorithm). Does not touch
/// disk; callers handle backup/atomic-write separately.
pub fn apply_hunks(original: &str, patch: &DiffPatch) -> Result<ApplyOutcome, ApplyError> {
    let mut lines: Vec<String> = if original.is_empty() {
        Vec::new()
    } else {
        original.split('\n').map(str::to_string).collect()
    };

    let mut drift_warnings = Vec::new();
    // Hunks are applied in order; each hunk's declared start is relative to
    // the *original* file, so we track a running offset as earlier hunks
    // change the line count.
    let mut offset: i64 = 0;

    for (index, hunk) in patch.hunks.iter().enumerate() {
        let context_and_removed: Vec<&str> = hunk
            .lines
            .iter()
            .filter_map(|l| match l {
                DiffLine::Context(s) | DiffLine::Removed(s) => Some(s.as_str()),
                DiffLine::Added(_) => None,
            })
            .collect();

        let declared_anchor = (hunk.original_start as i64 - 1 + offset).max(0);
        let anchor = locate_anchor(&lines, declared_anchor, &context_and_removed)
            .ok_or(ApplyError::ContextMismatch { hunk_index: index })?;

        let drift = anchor - declared_anchor;
        if drift.abs() > DRIFT_WARNING_THRESHOLD {
            drift_warnings.push(DriftWarning {
                hunk_index: index,
                drift,
            });
        }

        let mut replacement = Vec::new();
        for line in &hunk.lines {
            match line {
                DiffLine::Context(s) | DiffLine::Added(s) => replacement.push(s.clone()),
                DiffLine::Removed(_) => {}
            }
        }

        let anchor_usize = anchor as usize;
        let remove_count = context_and_removed.len();
        lines.splice(anchor_usize..(anchor_usize + remove_count), replacement.clone());

        offset += replacement.len() as i64 - remove_count as i64;
    }

    Ok(ApplyOutcome {
        new_content: lines.join("\n"),
        drift_warnings,
    })
}

/// Searches for the first line index within [`DRIFT_WINDOW`] of
/// `declared_anchor` where the full context/removed line sequence matches.
fn locate_anchor(lines: &[String], declared_anchor: i64, expected: &[&str]) -> Option<i64> {
    if expected.is_empty() {
        return Some(declared_anchor.clamp(0, lines.len() as i64));
    }
    for delta in 0..=DRIFT_WINDOW {
        for sign in [1, -1] {
            if delta == 0 && sign == -1 {
                continue;
            }
            let candidate = declared_anchor + sign * delta;
            if candidate < 0 {
                continue;
            }
            if matches_at(lines, candidate as usize, expected) {
                return Some(candidate);
            }
        }
    }
    None
}

fn matches_at(lines: &[String], start: usize, expected: &[&str]) -> bool {
    if start + expected.len() > lines.len() {
        return false;
    }
    lines[start..start + expected.len()]
        .iter()
        .zip(expected.iter())
        .all(|(a, b)| a == *b)
}

/// Used by the transaction layer to detect a no-op diff (§8: "applying an
/// empty diff leaves file bytes identical").
pub fn is_noop(patch: &DiffPatch) -> bool {
    patch.hunks.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_single_file_diff;
    use orc_manifest::FileOperation;

    fn patch_with_hunk(hunk: Hunk) -> DiffPatch {
        DiffPatch {
            target_path: "f.txt".to_string(),
            hunks: vec![hunk],
            operation: FileOperation::Modify,
            is_binary: false,
        }
    }

    #[test]
    fn applies_a_clean_hunk_with_no_drift() {
        let original = "a\nb\nc\n";
        let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -2,1 +2,1 @@\n-b\n+B\n";
        let patch = parse_single_file_diff(diff).unwrap();
        let outcome = apply_hunks(original, &patch).unwrap();
        assert_eq!(outcome.new_content, "a\nB\nc\n");
        assert!(outcome.drift_warnings.is_empty());
    }

    #[test]
    fn drift_of_two_applies_without_warning() {
        // Declared anchor points at line 1, but actual content shifted down
        // by two lines; context still locatable within the window.
        let original = "x\ny\na\nb\nc\n";
        let hunk = Hunk {
            original_start: 1,
            original_count: 1,
            modified_start: 1,
            modified_count: 1,
            lines: vec![
                crate::diff::DiffLine::Removed("a".to_string()),
                crate::diff::DiffLine::Added("A".to_string()),
            ],
        };
        let patch = patch_with_hunk(hunk);
        let outcome = apply_hunks(original, &patch).unwrap();
        assert!(outcome.drift_warnings.is_empty(), "{:?}", outcome.drift_warnings);
        assert!(outcome.new_content.contains('A'));
    }

    #[test]
    fn drift_of_three_applies_with_warning() {
        let original = "p\nq\nr\na\nb\n";
        let hunk = Hunk {
            original_start: 1,
            original_count: 1,
            modified_start: 1,
            modified_count: 1,
            lines: vec![
                crate::diff::DiffLine::Removed("a".to_string()),
                crate::diff::DiffLine::Added("A".to_string()),
            ],
        };
        let patch = patch_with_hunk(hunk);
        let outcome = apply_hunks(original, &patch).unwrap();
        assert_eq!(outcome.drift_warnings.len(), 1);
    }

    #[test]
    fn no_match_within_window_fails_with_context_mismatch() {
        let original = "completely\nunrelated\ncontent\n";
        let hunk = Hunk {
            original_start: 1,
            original_count: 1,
            modified_start: 1,
            modified_count: 1,
            lines: vec![
                crate::diff::DiffLine::Removed("a".to_string()),
                crate::diff::DiffLine::Added("A".to_string()),
            ],
        };
        let patch = patch_with_hunk(hunk);
        assert!(matches!(
            apply_hunks(original, &patch),
            Err(ApplyError::ContextMismatch { hunk_index: 0 })
        ));
    }

    #[test]
    fn empty_diff_is_a_noop() {
        let patch = DiffPatch {
            target_path: "f.txt".to_string(),
            hunks: vec![],
            operation: FileOperation::Modify,
            is_binary: false,
        };
        assert!(is_noop(&patch));
        let outcome = apply_hunks("unchanged\n", &patch).unwrap();
        assert_eq!(outcome.new_content, "unchanged\n");
    }

    proptest::proptest! {
        /// Any declared anchor within `DRIFT_WINDOW` of a hunk's true,
        /// uniquely-matching location is found regardless of which direction
        /// or how far within the window it's off by.
        #[test]
        fn drift_within_window_always_locates_the_anchor(
            num_lines in 12usize..20,
            target_index in 3usize..7,
            shift in -DRIFT_WINDOW..=DRIFT_WINDOW,
        ) {
            let lines: Vec<String> = (0..num_lines).map(|i| format!("line{i}")).collect();
            let original = lines.join("\n");
            let declared_anchor_1based = target_index as i64 + 1 + shift;

            let hunk = Hunk {
                original_start: declared_anchor_1based as u32,
                original_count: 1,
                modified_start: declared_anchor_1based as u32,
                modified_count: 1,
                lines: vec![
                    DiffLine::Removed(lines[target_index].clone()),
                    DiffLine::Added("REPLACED".to_string()),
                ],
            };
            let patch = patch_with_hunk(hunk);
            let outcome = apply_hunks(&original, &patch);
            proptest::prop_assert!(outcome.is_ok());
            proptest::prop_assert!(outcome.unwrap().new_content.contains("REPLACED"));
        }
    }
}
