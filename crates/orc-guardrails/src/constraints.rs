use std::collections::BTreeSet;

use orc_manifest::ManifestEntry;
use orc_types::StackSpec;

/// The small closed set of user constraint tokens §4.3 names explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintToken {
    NoExtraLibraries,
    IncludeEnvExample,
    UsePnpm,
}

impl ConstraintToken {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "no_extra_libraries" => Some(ConstraintToken::NoExtraLibraries),
            "include_env_example" => Some(ConstraintToken::IncludeEnvExample),
            "use_pnpm" => Some(ConstraintToken::UsePnpm),
            _ => None,
        }
    }
}

/// Only imports resolving to built-ins or the stack's common-dependency set
/// are allowed. A lightweight import-statement scan; languages differ in
/// syntax, so this looks for the dependency name appearing as an import
/// target rather than parsing each language's grammar.
pub(crate) fn check_no_extra_libraries(spec: &StackSpec, manifest: &[ManifestEntry], errors: &mut Vec<String>) {
    let allowed = &spec.common_dependencies;
    for entry in manifest {
        for line in entry.content.lines() {
            if let Some(dep) = extract_import_target(line) {
                if !allowed.contains(&dep) && !is_builtin_like(&dep) {
                    errors.push(format!(
                        "{}: import of `{}` is not in the stack's common dependency set",
                        entry.path, dep
                    ));
                }
            }
        }
    }
}

fn extract_import_target(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("import ") {
        return Some(first_token(rest));
    }
    if let Some(rest) = trimmed.strip_prefix("from ") {
        return Some(first_token(rest));
    }
    if trimmed.contains("require(") {
        let start = trimmed.find("require(")? + "require(".len();
        let rest = &trimmed[start..];
        let quote = rest.chars().next()?;
        if quote == '\'' || quote == '"' {
            let end = rest[1..].find(quote)? + 1;
            return Some(rest[1..end].to_string());
        }
    }
    None
}

fn first_token(rest: &str) -> String {
    rest.split(|c: char| c.is_whitespace() || c == ';' || c == '.')
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .trim_matches(['\'', '"'])
        .to_string()
}

fn is_builtin_like(dep: &str) -> bool {
    const BUILTINS: &[&str] = &["os", "sys", "json", "fs", "path", "http", "typing", "datetime"];
    BUILTINS.contains(&dep) || dep.starts_with('.')
}

/// A manifest containing server code must include an env-example file.
/// "Server code" is detected heuristically via the stack's required files
/// being present (i.e. this is in fact a server for that stack).
pub(crate) fn check_include_env_example(
    spec: &StackSpec,
    paths: &BTreeSet<&str>,
    manifest: &[ManifestEntry],
    errors: &mut Vec<String>,
) {
    let looks_like_server = spec.required_files.iter().any(|f| paths.contains(f.as_str()));
    if !looks_like_server {
        return;
    }
    let has_env_example = manifest
        .iter()
        .any(|e| e.path == ".env.example" || e.path.ends_with("/.env.example"));
    if !has_env_example {
        errors.push("include_env_example constraint requires a .env.example file".to_string());
    }
}

/// For Node stacks, the package manifest must reference pnpm.
pub(crate) fn check_use_pnpm(spec: &StackSpec, manifest: &[ManifestEntry], errors: &mut Vec<String>) {
    if spec.language != "typescript" {
        return;
    }
    let package_json = manifest.iter().find(|e| e.path == "package.json");
    match package_json {
        Some(entry) if entry.content.contains("pnpm") => {}
        _ => errors.push("use_pnpm constraint requires package.json to reference pnpm".to_string()),
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

    #[test]
    fn no_extra_libraries_flags_unlisted_import() {
        let spec = StackSpec::builtin(StackTag::Fastapi);
        let manifest = vec![entry("main.py", "import requests\n")];
        let mut errors = Vec::new();
        check_no_extra_libraries(&spec, &manifest, &mut errors);
        assert!(!errors.is_empty());
    }

    #[test]
    fn no_extra_libraries_allows_common_dependency() {
        let spec = StackSpec::builtin(StackTag::Fastapi);
        let manifest = vec![entry("main.py", "import fastapi\n")];
        let mut errors = Vec::new();
        check_no_extra_libraries(&spec, &manifest, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn env_example_required_when_server_detected() {
        let spec = StackSpec::builtin(StackTag::Fastapi);
        let manifest = vec![entry("main.py", "x"), entry("requirements.txt", "fastapi")];
        let paths: BTreeSet<&str> = manifest.iter().map(|e| e.path.as_str()).collect();
        let mut errors = Vec::new();
        check_include_env_example(&spec, &paths, &manifest, &mut errors);
        assert!(!errors.is_empty());
    }

    #[test]
    fn use_pnpm_passes_when_referenced() {
        let spec = StackSpec::builtin(StackTag::ExpressTs);
        let manifest = vec![entry("package.json", "{\"packageManager\": \"pnpm@9\"}")];
        let mut errors = Vec::new();
        check_use_pnpm(&spec, &manifest, &mut errors);
        assert!(errors.is_empty());
    }
}
