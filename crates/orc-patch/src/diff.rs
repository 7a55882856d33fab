use std::fmt;

use orc_manifest::FileOperation;

/// One line inside a hunk, tagged by how it participates in the patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// A contiguous change region delimited by an `@@ ... @@` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub original_start: u32,
    pub original_count: u32,
    pub modified_start: u32,
    pub modified_count: u32,
    pub lines: Vec<DiffLine>,
}

/// A parsed unified diff for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPatch {
    pub target_path: String,
    pub hunks: Vec<Hunk>,
    pub operation: FileOperation,
    pub is_binary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffParseError(pub String);

impl fmt::Display for DiffParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DiffParseError {}

/// Parses one unified diff covering a single file: `--- a/<path>` /
/// `+++ b/<path>` headers, then zero or more `@@ -s,c +s,c @@` hunks.
/// `/dev/null` on either side signals create/delete per §4.4.
pub fn parse_single_file_diff(text: &str) -> Result<DiffPatch, DiffParseError> {
    let mut lines = text.lines().peekable();

    let minus_header = lines
        .next()
        .ok_or_else(|| DiffParseError("empty diff".to_string()))?;
    let plus_header = lines
        .next()
        .ok_or_else(|| DiffParseError("diff missing +++ header".to_string()))?;

    if !minus_header.starts_with("--- ") {
        return Err(DiffParseError(format!(
            "expected '--- a/<path>' header, got: {minus_header}"
        )));
    }
    if !plus_header.starts_with("+++ ") {
        return Err(DiffParseError(format!(
            "expected '+++ b/<path>' header, got: {plus_header}"
        )));
    }

    let source = strip_diff_prefix(&minus_header[4..]);
    let target = strip_diff_prefix(&plus_header[4..]);

    let operation = match (source.as_str(), target.as_str()) {
        ("/dev/null", _) => FileOperation::Create,
        (_, "/dev/null") => FileOperation::Delete,
        _ => FileOperation::Modify,
    };

    let target_path = if target == "/dev/null" { source } else { target };

    if text.contains("Binary files ") {
        return Ok(DiffPatch {
            target_path,
            hunks: vec![],
            operation,
            is_binary: true,
        });
    }

    let mut hunks = Vec::new();
    while let Some(line) = lines.peek() {
        if line.starts_with("@@ ") {
            let header = lines.next().unwrap();
            let (orig, modified) = parse_hunk_header(header)?;
            let mut body = Vec::new();
            let expected_total = orig.1 as usize + modified.1 as usize;
            // A hunk body is bounded by the next @@ header or EOF; we read
            // greedily and trust the header counts to know when a hunk's
            // context/added/removed lines are fully consumed would require
            // tracking separately, since removed+context count toward
            // original and added+context toward modified.
            let mut orig_seen = 0u32;
            let mut mod_seen = 0u32;
            while orig_seen < orig.1 || mod_seen < modified.1 {
                let Some(next) = lines.peek() else {
                    return Err(DiffParseError("hunk ended before declared line count".to_string()));
                };
                if next.starts_with("@@ ") {
                    return Err(DiffParseError("hunk ended before declared line count".to_string()));
                }
                let raw = lines.next().unwrap();
                let (tag, rest) = raw.split_at(1.min(raw.len()));
                match tag {
                    "+" => {
                        body.push(DiffLine::Added(rest.to_string()));
                        mod_seen += 1;
                    }
                    "-" => {
                        body.push(DiffLine::Removed(rest.to_string()));
                        orig_seen += 1;
                    }
                    " " | "" => {
                        body.push(DiffLine::Context(rest.to_string()));
                        orig_seen += 1;
                        mod_seen += 1;
                    }
                    other => {
                        return Err(DiffParseError(format!("invalid hunk line prefix: {other:?}")));
                    }
                }
                if body.len() > expected_total + 1 {
                    return Err(DiffParseError("hunk body longer than its header declares".to_string()));
                }
            }
            hunks.push(Hunk {
                original_start: orig.0,
                original_count: orig.1,
                modified_start: modified.0,
                modified_count: modified.1,
                lines: body,
            });
        } else {
            break;
        }
    }

    Ok(DiffPatch {
        target_path,
        hunks,
        operation,
        is_binary: false,
    })
}

fn strip_diff_prefix(header_rest: &str) -> String {
    let trimmed = header_rest.split('\t').next().unwrap_or(header_rest).trim();
    if trimmed == "/dev/null" {
        return trimmed.to_string();
    }
    trimmed
        .strip_prefix("a/")
        .or_else(|| trimmed.strip_prefix("b/"))
        .unwrap_or(trimmed)
        .to_string()
}

fn parse_hunk_header(header: &str) -> Result<((u32, u32), (u32, u32)), DiffParseError> {
    let inner = header
        .strip_prefix("@@ ")
        .and_then(|s| s.split(" @@").next())
        .ok_or_else(|| DiffParseError(format!("malformed hunk header: {header}")))?;
    let mut parts = inner.split(' ');
    let orig = parts
        .next()
        .ok_or_else(|| DiffParseError(format!("malformed hunk header: {header}")))?;
    let modified = parts
        .next()
        .ok_or_else(|| DiffParseError(format!("malformed hunk header: {header}")))?;
    Ok((parse_range(orig, '-')?, parse_range(modified, '+')?))
}

fn parse_range(raw: &str, expected_sign: char) -> Result<(u32, u32), DiffParseError> {
    let rest = raw
        .strip_prefix(expected_sign)
        .ok_or_else(|| DiffParseError(format!("expected range starting with {expected_sign}: {raw}")))?;
    let mut pieces = rest.splitn(2, ',');
    let start: u32 = pieces
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DiffParseError(format!("invalid range start: {raw}")))?;
    let count: u32 = match pieces.next() {
        Some(c) => c.parse().map_err(|_| DiffParseError(format!("invalid range count: {raw}")))?,
        None => 1,
    };
    Ok((start, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_modify_hunk() {
        let diff = "--- a/main.py\n+++ b/main.py\n@@ -1,2 +1,2 @@\n-old\n+new\n context\n";
        let patch = parse_single_file_diff(diff).unwrap();
        assert_eq!(patch.target_path, "main.py");
        assert_eq!(patch.operation, FileOperation::Modify);
        assert_eq!(patch.hunks.len(), 1);
        assert_eq!(patch.hunks[0].lines.len(), 3);
    }

    #[test]
    fn dev_null_source_means_create() {
        let diff = "--- /dev/null\n+++ b/new.py\n@@ -0,0 +1,1 @@\n+print(1)\n";
        let patch = parse_single_file_diff(diff).unwrap();
        assert_eq!(patch.operation, FileOperation::Create);
        assert_eq!(patch.target_path, "new.py");
    }

    #[test]
    fn dev_null_target_means_delete() {
        let diff = "--- a/old.py\n+++ /dev/null\n@@ -1,1 +0,0 @@\n-print(1)\n";
        let patch = parse_single_file_diff(diff).unwrap();
        assert_eq!(patch.operation, FileOperation::Delete);
        assert_eq!(patch.target_path, "old.py");
    }

    #[test]
    fn binary_diffs_are_detected() {
        let diff = "--- a/image.png\n+++ b/image.png\nBinary files a/image.png and b/image.png differ\n";
        let patch = parse_single_file_diff(diff).unwrap();
        assert!(patch.is_binary);
        assert!(patch.hunks.is_empty());
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(parse_single_file_diff("not a diff at all").is_err());
    }
}
