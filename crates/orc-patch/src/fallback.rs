use std::path::Path;

/// On a failed patch, three sibling files are written next to the target
/// for human review and never auto-cleaned within the same run (§4.4).
pub fn write_fallback_artifacts(
    target: &Path,
    attempted_content: Option<&str>,
    apply_log: &str,
    failed_diff: &str,
) -> std::io::Result<()> {
    if let Some(content) = attempted_content {
        std::fs::write(sibling(target, "mgx_new"), content)?;
    }
    std::fs::write(sibling(target, "mgx_apply_log.txt"), apply_log)?;
    std::fs::write(sibling(target, "mgx_failed_diff.txt"), failed_diff)?;
    Ok(())
}

fn sibling(target: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    target.with_file_name(name)
}

/// Timestamped backup path for a modified file, written before touching it
/// when `backup=true` (the default).
pub fn backup_path(target: &Path, now: chrono::DateTime<chrono::Utc>) -> std::path::PathBuf {
    let ts = now.format("%Y%m%d%H%M%S");
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{ts}.bak"));
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fallback_artifact_names_match_the_contract() {
        let target = PathBuf::from("/tmp/project/src/main.py");
        assert_eq!(
            sibling(&target, "mgx_new"),
            PathBuf::from("/tmp/project/src/main.py.mgx_new")
        );
        assert_eq!(
            sibling(&target, "mgx_apply_log.txt"),
            PathBuf::from("/tmp/project/src/main.py.mgx_apply_log.txt")
        );
    }

    #[test]
    fn backup_path_has_a_compact_timestamp_suffix() {
        let target = PathBuf::from("/tmp/project/src/main.py");
        let now = chrono::DateTime::parse_from_rfc3339("2026-08-01T12:30:45Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(
            backup_path(&target, now),
            PathBuf::from("/tmp/project/src/main.py.20260801123045.bak")
        );
    }
}
