use std::collections::BTreeSet;

use orc_manifest::ManifestEntry;
use orc_types::StackSpec;

pub(crate) fn check_required_files(spec: &StackSpec, paths: &BTreeSet<&str>, errors: &mut Vec<String>) {
    for required in &spec.required_files {
        if !paths.contains(required.as_str()) {
            errors.push(format!("missing required file: {required}"));
        }
    }
}

pub(crate) fn check_required_dirs(spec: &StackSpec, paths: &BTreeSet<&str>, errors: &mut Vec<String>) {
    for dir in &spec.required_dirs {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        if !paths.iter().any(|p| p.starts_with(&prefix)) {
            errors.push(format!("no file found under required directory: {dir}"));
        }
    }
}

pub(crate) fn check_forbidden_files(spec: &StackSpec, paths: &BTreeSet<&str>, errors: &mut Vec<String>) {
    for forbidden in &spec.forbidden_files {
        if paths.contains(forbidden.as_str()) {
            errors.push(format!("forbidden file present: {forbidden}"));
        }
    }
}

/// Absence of a required command substring is a warning, not an error,
/// per §4.3.
pub(crate) fn check_required_commands(spec: &StackSpec, manifest: &[ManifestEntry], warnings: &mut Vec<String>) {
    if spec.required_commands.is_empty() {
        return;
    }
    let haystack: String = manifest.iter().map(|e| e.content.as_str()).collect();
    for command in &spec.required_commands {
        if !haystack.contains(command.as_str()) {
            warnings.push(format!("expected command script not found: {command}"));
        }
    }
}

/// Applied line-by-line after stripping `//` and `#` line comments and
/// quoted string literals, so a regex matching an import pattern inside a
/// comment or a string does not false-positive. Each pattern in
/// `forbidden_imports` is a regex per §4.3/§6, not a substring.
pub(crate) fn check_forbidden_imports(spec: &StackSpec, manifest: &[ManifestEntry], errors: &mut Vec<String>) {
    if spec.forbidden_imports.is_empty() {
        return;
    }
    let patterns: Vec<(&str, Option<regex::Regex>)> = spec
        .forbidden_imports
        .iter()
        .map(|pattern| (pattern.as_str(), regex::Regex::new(pattern).ok()))
        .collect();
    for (pattern, compiled) in &patterns {
        if compiled.is_none() {
            errors.push(format!("invalid forbidden_imports pattern: `{pattern}`"));
        }
    }

    for entry in manifest {
        for line in entry.content.lines() {
            let stripped = strip_comments_and_strings(line);
            for (pattern, compiled) in &patterns {
                let Some(regex) = compiled else { continue };
                if regex.is_match(&stripped) {
                    errors.push(format!(
                        "forbidden import in {}: matched `{}`",
                        entry.path, pattern
                    ));
                }
            }
        }
    }
}

fn strip_comments_and_strings(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_string: Option<char> = None;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match in_string {
            Some(q) => {
                if c == q {
                    in_string = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    in_string = Some(c);
                } else if c == '#' {
                    break;
                } else if c == '/' && chars.peek() == Some(&'/') {
                    break;
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Monorepos combining indicators of more than one stack (e.g. both
/// `package.json` and `requirements.txt`) are legal; emit a warning only.
pub(crate) fn check_mixed_stack(manifest: &[ManifestEntry], warnings: &mut Vec<String>) {
    const INDICATORS: &[&str] = &[
        "package.json",
        "requirements.txt",
        "composer.json",
        "Dockerfile",
        "Program.cs",
    ];
    let present: Vec<&str> = INDICATORS
        .iter()
        .copied()
        .filter(|ind| manifest.iter().any(|e| e.path == *ind))
        .collect();
    if present.len() > 1 {
        warnings.push(format!(
            "indicators of more than one stack present: {}",
            present.join(", ")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_manifest::FileOperation;
    use orc_types::StackTag;

    fn entry(path: &str, content: &str) -> ManifestEntry {
        ManifestEntry {
            path: path.to_string(),
            content: content.to_string(),
            operation: FileOperation::Create,
            language: None,
        }
    }

    fn spec_with_forbidden_imports(patterns: &[&str]) -> StackSpec {
        let mut spec = StackSpec::builtin(StackTag::Fastapi);
        spec.forbidden_imports = patterns.iter().map(|p| p.to_string()).collect();
        spec
    }

    #[test]
    fn forbidden_imports_are_regexes_not_substrings() {
        let spec = spec_with_forbidden_imports(&[r"^import\s+os$"]);
        let mut errors = Vec::new();
        // Would false-positive under a plain substring match against "import os".
        let manifest = vec![entry("main.py", "import os_utils\nimport os")];
        check_forbidden_imports(&spec, &manifest, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("import os"));
    }

    #[test]
    fn forbidden_imports_ignores_matches_inside_comments_and_strings() {
        let spec = spec_with_forbidden_imports(&[r"eval\("]);
        let mut errors = Vec::new();
        let manifest = vec![entry("main.py", "# eval(x) is forbidden\nx = \"eval(y)\"")];
        check_forbidden_imports(&spec, &manifest, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn invalid_forbidden_imports_regex_is_reported_as_an_error() {
        let spec = spec_with_forbidden_imports(&["("]);
        let mut errors = Vec::new();
        check_forbidden_imports(&spec, &[], &mut errors);
        assert!(errors.iter().any(|e| e.contains("invalid forbidden_imports pattern")));
    }
}
