/// The four logical roles in the pipeline, described by capability rather
/// than by a distinct Rust type (§4.8: "Roles (capabilities, not types)").
/// Each carries its own system-prompt template and the tag used to filter
/// the shared message log down to what that role is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Planner,
    Implementer,
    Tester,
    Reviewer,
}

impl Role {
    pub fn tag(self) -> &'static str {
        match self {
            Role::Planner => "planner",
            Role::Implementer => "implementer",
            Role::Tester => "tester",
            Role::Reviewer => "reviewer",
        }
    }

    /// The system prompt template for this role. `{stack}` and
    /// `{task_description}` are the only placeholders any role template
    /// uses; callers render them before sending the prompt to a model.
    pub fn system_prompt_template(self) -> &'static str {
        match self {
            Role::Planner => {
                "You are the planning role. Given a task description and an optional \
                 stack hint, produce a complexity tag, a proposed stack, and a \
                 stepwise implementation plan for: {task_description}"
            }
            Role::Implementer => {
                "You are the implementation role for the {stack} stack. Emit a complete \
                 FILE-block manifest satisfying: {task_description}"
            }
            Role::Tester => {
                "You are the test-authoring role for the {stack} stack. Emit a \
                 FILE-block manifest of tests covering: {task_description}"
            }
            Role::Reviewer => {
                "You are the review role. Inspect the code and test manifests for: \
                 {task_description} and emit approved or changes_required."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_a_distinct_tag() {
        let tags: std::collections::BTreeSet<_> =
            [Role::Planner, Role::Implementer, Role::Tester, Role::Reviewer].map(Role::tag).into_iter().collect();
        assert_eq!(tags.len(), 4);
    }
}
