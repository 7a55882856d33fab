//! # orc-guardrails
//!
//! Deterministic validation of a parsed manifest against a stack's rule set
//! and the user's constraint tokens (§4.3). Pure and non-suspending: no I/O,
//! same `(manifest, stack, constraints)` always yields the same
//! [`ValidationResult`].

mod constraints;
mod revision;
mod rules;

pub use constraints::ConstraintToken;
pub use revision::build_revision_prompt;

use std::collections::BTreeSet;

use orc_manifest::ManifestEntry;
use orc_types::StackSpec;

/// Result of validating one manifest against one stack's rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn finish(errors: Vec<String>, warnings: Vec<String>) -> Self {
        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validates `manifest` against `spec` and the closed set of `constraints`
/// tokens from §4.3. Unknown constraint tokens produce a warning and are
/// otherwise ignored.
pub fn validate(manifest: &[ManifestEntry], spec: &StackSpec, constraints: &[String]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let paths: BTreeSet<&str> = manifest.iter().map(|e| e.path.as_str()).collect();

    rules::check_required_files(spec, &paths, &mut errors);
    rules::check_required_dirs(spec, &paths, &mut errors);
    rules::check_forbidden_files(spec, &paths, &mut errors);
    rules::check_required_commands(spec, manifest, &mut warnings);
    rules::check_forbidden_imports(spec, manifest, &mut errors);
    rules::check_mixed_stack(manifest, &mut warnings);

    for token in constraints {
        match ConstraintToken::parse(token) {
            Some(ConstraintToken::NoExtraLibraries) => {
                constraints::check_no_extra_libraries(spec, manifest, &mut errors)
            }
            Some(ConstraintToken::IncludeEnvExample) => {
                constraints::check_include_env_example(spec, &paths, manifest, &mut errors)
            }
            Some(ConstraintToken::UsePnpm) => constraints::check_use_pnpm(spec, manifest, &mut errors),
            None => warnings.push(format!("unknown constraint token ignored: {token}")),
        }
    }

    ValidationResult::finish(errors, warnings)
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
    fn fastapi_requires_main_and_requirements() {
        let spec = StackSpec::builtin(StackTag::Fastapi);
        let manifest = vec![entry("main.py", "x")];
        let result = validate(&manifest, &spec, &[]);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("requirements.txt")));
    }

    #[test]
    fn fastapi_with_both_required_files_is_valid() {
        let spec = StackSpec::builtin(StackTag::Fastapi);
        let manifest = vec![entry("main.py", "x"), entry("requirements.txt", "fastapi")];
        let result = validate(&manifest, &spec, &[]);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn determinism_same_inputs_same_result() {
        let spec = StackSpec::builtin(StackTag::ExpressTs);
        let manifest = vec![entry("package.json", "{}"), entry("src/index.ts", "x")];
        let a = validate(&manifest, &spec, &[]);
        let b = validate(&manifest, &spec, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn mixed_stack_indicators_are_a_warning_not_an_error() {
        let spec = StackSpec::builtin(StackTag::ExpressTs);
        let manifest = vec![
            entry("package.json", "{}"),
            entry("tsconfig.json", "{}"),
            entry("src/index.ts", "x"),
            entry("requirements.txt", "flask"),
        ];
        let result = validate(&manifest, &spec, &[]);
        assert!(result.warnings.iter().any(|w| w.contains("mixed") || w.contains("more than one stack")));
    }

    #[test]
    fn unknown_constraint_token_is_a_warning_only() {
        let spec = StackSpec::builtin(StackTag::Fastapi);
        let manifest = vec![entry("main.py", "x"), entry("requirements.txt", "fastapi")];
        let result = validate(&manifest, &spec, &["frobnicate_everything".to_string()]);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("unknown constraint")));
    }
}
