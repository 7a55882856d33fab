use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The closed vocabulary of stack tags a guardrail or manifest rule set may
/// be keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StackTag {
    ExpressTs,
    Nestjs,
    Fastapi,
    Laravel,
    Nextjs,
    ReactVite,
    VueVite,
    DevopsDocker,
    CiGithubActions,
    DotnetApi,
}

impl StackTag {
    /// Parses the on-the-wire kebab-case form used in task input and
    /// manifests; unrecognized strings are an `invalid_input`, not a panic.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "express-ts" => StackTag::ExpressTs,
            "nestjs" => StackTag::Nestjs,
            "fastapi" => StackTag::Fastapi,
            "laravel" => StackTag::Laravel,
            "nextjs" => StackTag::Nextjs,
            "react-vite" => StackTag::ReactVite,
            "vue-vite" => StackTag::VueVite,
            "devops-docker" => StackTag::DevopsDocker,
            "ci-github-actions" => StackTag::CiGithubActions,
            "dotnet-api" => StackTag::DotnetApi,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StackTag::ExpressTs => "express-ts",
            StackTag::Nestjs => "nestjs",
            StackTag::Fastapi => "fastapi",
            StackTag::Laravel => "laravel",
            StackTag::Nextjs => "nextjs",
            StackTag::ReactVite => "react-vite",
            StackTag::VueVite => "vue-vite",
            StackTag::DevopsDocker => "devops-docker",
            StackTag::CiGithubActions => "ci-github-actions",
            StackTag::DotnetApi => "dotnet-api",
        }
    }
}

/// The deterministic, read-only rule set associated with one stack tag.
/// Process-wide: constructed once (typically via [`StackSpec::builtin`]) and
/// shared by reference across every guardrail invocation for that stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackSpec {
    pub tag: StackTag,
    pub name: String,
    pub language: String,
    pub required_files: BTreeSet<String>,
    pub required_dirs: BTreeSet<String>,
    pub forbidden_files: BTreeSet<String>,
    pub required_commands: BTreeSet<String>,
    pub forbidden_imports: Vec<String>,
    pub common_dependencies: BTreeSet<String>,
}

impl StackSpec {
    /// The built-in rule set for a stack tag. Embedding applications may
    /// override any of these fields after construction; the guardrail
    /// consumes whatever `StackSpec` it is handed.
    pub fn builtin(tag: StackTag) -> Self {
        match tag {
            StackTag::Fastapi => StackSpec {
                tag,
                name: "FastAPI".into(),
                language: "python".into(),
                required_files: ["main.py", "requirements.txt"].map(String::from).into(),
                required_dirs: BTreeSet::new(),
                forbidden_files: BTreeSet::new(),
                required_commands: BTreeSet::new(),
                forbidden_imports: vec![],
                common_dependencies: ["fastapi", "uvicorn", "pydantic"].map(String::from).into(),
            },
            StackTag::ExpressTs => StackSpec {
                tag,
                name: "Express + TypeScript".into(),
                language: "typescript".into(),
                required_files: ["package.json", "tsconfig.json"].map(String::from).into(),
                required_dirs: ["src"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: ["build", "start"].map(String::from).into(),
                forbidden_imports: vec![],
                common_dependencies: ["express", "typescript"].map(String::from).into(),
            },
            StackTag::Nestjs => StackSpec {
                tag,
                name: "NestJS".into(),
                language: "typescript".into(),
                required_files: ["package.json", "tsconfig.json", "nest-cli.json"]
                    .map(String::from)
                    .into(),
                required_dirs: ["src"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: ["build", "start"].map(String::from).into(),
                forbidden_imports: vec![],
                common_dependencies: ["@nestjs/core", "@nestjs/common"].map(String::from).into(),
            },
            StackTag::Laravel => StackSpec {
                tag,
                name: "Laravel".into(),
                language: "php".into(),
                required_files: ["composer.json", "artisan"].map(String::from).into(),
                required_dirs: ["app", "routes"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: BTreeSet::new(),
                forbidden_imports: vec![],
                common_dependencies: ["laravel/framework"].map(String::from).into(),
            },
            StackTag::Nextjs => StackSpec {
                tag,
                name: "Next.js".into(),
                language: "typescript".into(),
                required_files: ["package.json", "next.config.js"].map(String::from).into(),
                required_dirs: ["app"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: ["build", "dev"].map(String::from).into(),
                forbidden_imports: vec![],
                common_dependencies: ["next", "react", "react-dom"].map(String::from).into(),
            },
            StackTag::ReactVite => StackSpec {
                tag,
                name: "React + Vite".into(),
                language: "typescript".into(),
                required_files: ["package.json", "vite.config.ts", "index.html"]
                    .map(String::from)
                    .into(),
                required_dirs: ["src"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: ["build", "dev"].map(String::from).into(),
                forbidden_imports: vec![],
                common_dependencies: ["react", "react-dom", "vite"].map(String::from).into(),
            },
            StackTag::VueVite => StackSpec {
                tag,
                name: "Vue + Vite".into(),
                language: "typescript".into(),
                required_files: ["package.json", "vite.config.ts", "index.html"]
                    .map(String::from)
                    .into(),
                required_dirs: ["src"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: ["build", "dev"].map(String::from).into(),
                forbidden_imports: vec![],
                common_dependencies: ["vue", "vite"].map(String::from).into(),
            },
            StackTag::DevopsDocker => StackSpec {
                tag,
                name: "Docker".into(),
                language: "dockerfile".into(),
                required_files: ["Dockerfile"].map(String::from).into(),
                required_dirs: BTreeSet::new(),
                forbidden_files: BTreeSet::new(),
                required_commands: BTreeSet::new(),
                forbidden_imports: vec![],
                common_dependencies: BTreeSet::new(),
            },
            StackTag::CiGithubActions => StackSpec {
                tag,
                name: "GitHub Actions".into(),
                language: "yaml".into(),
                required_files: BTreeSet::new(),
                required_dirs: [".github/workflows"].map(String::from).into(),
                forbidden_files: BTreeSet::new(),
                required_commands: BTreeSet::new(),
                forbidden_imports: vec![],
                common_dependencies: BTreeSet::new(),
            },
            StackTag::DotnetApi => StackSpec {
                tag,
                name: ".NET API".into(),
                language: "csharp".into(),
                required_files: ["Program.cs"].map(String::from).into(),
                required_dirs: BTreeSet::new(),
                forbidden_files: BTreeSet::new(),
                required_commands: BTreeSet::new(),
                forbidden_imports: vec![],
                common_dependencies: BTreeSet::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_kebab_case() {
        for tag in [
            StackTag::ExpressTs,
            StackTag::Fastapi,
            StackTag::DotnetApi,
            StackTag::CiGithubActions,
        ] {
            assert_eq!(StackTag::parse(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn unknown_tag_parses_to_none() {
        assert_eq!(StackTag::parse("cobol-cics"), None);
    }
}
