use crate::ValidationResult;

/// Builds the structured revision instruction handed back to the
/// orchestrator on a failed validation (§4.3). This is the exact text given
/// to the Implementer/Tester for the next attempt: the original task
/// description, the full error list, the warning list, and an explicit
/// directive to regenerate a complete corrected manifest.
pub fn build_revision_prompt(task_description: &str, result: &ValidationResult) -> String {
    let mut prompt = String::new();
    prompt.push_str("The previous file manifest failed validation and must be corrected.\n\n");
    prompt.push_str("Original task:\n");
    prompt.push_str(task_description);
    prompt.push_str("\n\nErrors (must all be fixed):\n");
    if result.errors.is_empty() {
        prompt.push_str("- (none)\n");
    } else {
        for error in &result.errors {
            prompt.push_str("- ");
            prompt.push_str(error);
            prompt.push('\n');
        }
    }
    prompt.push_str("\nWarnings (address if reasonable):\n");
    if result.warnings.is_empty() {
        prompt.push_str("- (none)\n");
    } else {
        for warning in &result.warnings {
            prompt.push_str("- ");
            prompt.push_str(warning);
            prompt.push('\n');
        }
    }
    prompt.push_str(
        "\nRegenerate a complete, corrected FILE manifest. Do not emit a partial diff; \
         emit every file the task requires from scratch.\n",
    );
    prompt
}
