use orc_types::OrcError;

use crate::role::Role;

/// One request to a role. `prompt` is the fully rendered system prompt plus
/// whatever relevant-memory slice and revision notes the orchestrator has
/// assembled; the model adapter does not see the raw message log.
#[derive(Debug, Clone)]
pub struct RoleRequest {
    pub role: Role,
    pub prompt: String,
}

/// A role's raw output, plus an estimated token count fed into the
/// pipeline's reported totals (§4.8's "estimated token counts").
#[derive(Debug, Clone)]
pub struct RoleResponse {
    pub text: String,
    pub estimated_tokens: u32,
}

/// The seam between the orchestrator and whatever actually calls a language
/// model. No concrete client ships in the core, matching the same
/// thin-adapter boundary [`orc_git::PullRequestProvider`] draws for hosting
/// providers: the embedding application supplies its own implementation.
pub trait RoleModel: Send + Sync {
    fn complete(&self, request: &RoleRequest) -> Result<RoleResponse, OrcError>;
}

/// A deterministic stand-in used by the CLI demo and by tests: echoes a
/// fixed, role-shaped response derived only from the prompt's length, never
/// making any I/O call. Not meant to produce usable code; it exists so the
/// pipeline's control flow can be exercised without a real model.
pub struct StubRoleModel;

impl RoleModel for StubRoleModel {
    fn complete(&self, request: &RoleRequest) -> Result<RoleResponse, OrcError> {
        let text = match request.role {
            Role::Planner => "complexity: s\nstack: fastapi\nplan:\n1. scaffold project\n2. add endpoint".to_string(),
            Role::Implementer => "FILE: main.py\nfrom fastapi import FastAPI\napp = FastAPI()\n\n@app.get(\"/ping\")\ndef ping():\n    return {\"status\": \"ok\"}\nFILE: requirements.txt\nfastapi\nuvicorn\n".to_string(),
            Role::Tester => "FILE: test_main.py\nfrom main import app\n".to_string(),
            Role::Reviewer => "verdict: approved".to_string(),
        };
        let estimated_tokens = (request.prompt.len() / 4).max(1) as u32;
        Ok(RoleResponse { text, estimated_tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_planner_output_is_parseable_by_the_analyze_step() {
        let model = StubRoleModel;
        let response = model
            .complete(&RoleRequest {
                role: Role::Planner,
                prompt: "plan a ping endpoint".into(),
            })
            .unwrap();
        assert!(response.text.contains("complexity"));
        assert!(response.estimated_tokens > 0);
    }
}
