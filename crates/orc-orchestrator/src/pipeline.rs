use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use orc_cache::{Cache, CacheKeyInput};
use orc_guardrails::build_revision_prompt;
use orc_manifest::ManifestEntry;
use orc_types::{ErrorKind, OrcError, StackSpec, StackTag, Task};

use crate::complexity::ComplexityTag;
use crate::memory::{MemoryEntry, MessageLog, RELEVANT_SLICE_SIZE};
use crate::model::{RoleModel, RoleRequest};
use crate::role::Role;

/// Outcome of the Planner's analyze phase (§4.8 step 1). Memoized via C1
/// keyed by the fingerprint of task + stack hint + model.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub complexity: ComplexityTag,
    pub stack: StackTag,
    pub manifest_sketch: String,
}

#[derive(Debug, Clone)]
pub struct PlanResult {
    pub plan_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    ChangesRequired { notes: String },
}

/// The structured result of the code/test/review phases (§4.8's "Output").
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub manifest: Vec<ManifestEntry>,
    pub test_manifest: Vec<ManifestEntry>,
    pub review_verdict: ReviewVerdict,
    pub revision_count: u32,
    pub phase_timings: BTreeMap<String, Duration>,
    pub estimated_tokens: u32,
}

/// Why the pipeline gave up instead of producing an accepted manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeedsInfoReason {
    RevisionRoundsExhausted { phase: &'static str },
    ReviewRoundsExhausted,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Completed(PipelineResult),
    NeedsInfo(NeedsInfoReason),
}

/// Drives the analyze → plan → (approval, external) → code → test → review
/// sequence (§4.8, C8). The approval gate itself belongs to the executor;
/// this type exposes `analyze`/`plan`/`code_test_review` as the three
/// callable phases the executor sequences around it.
pub struct Orchestrator {
    model: std::sync::Arc<dyn RoleModel>,
    model_name: String,
    cache: Cache,
    max_rounds: u32,
    max_revision_rounds: u32,
    log: MessageLog,
}

impl Orchestrator {
    /// `model` is shared (`Arc`) rather than owned by value so one executor
    /// can hand every run its own `Orchestrator` (and so its own private
    /// message log, per §4.8's "shared between roles" meaning shared within
    /// one run, not across runs) while reusing the same underlying model
    /// client and cache.
    pub fn new(
        model: std::sync::Arc<dyn RoleModel>,
        model_name: impl Into<String>,
        cache: Cache,
        max_rounds: u32,
        max_revision_rounds: u32,
    ) -> Self {
        Orchestrator {
            model,
            model_name: model_name.into(),
            cache,
            max_rounds,
            max_revision_rounds,
            log: MessageLog::new(),
        }
    }

    fn task_keywords(task: &Task) -> Vec<String> {
        task.title
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }

    fn render(template: &str, task: &Task, stack: Option<&str>) -> String {
        template
            .replace("{task_description}", &task.description)
            .replace("{stack}", stack.unwrap_or("unspecified"))
    }

    /// §4.8 step 1: returns a complexity tag, proposed stack, and a draft
    /// manifest sketch. Memoized by the fingerprint of task + stack hint +
    /// model; an identical task/hint/model combination never re-invokes the
    /// model while its cache entry is live.
    pub fn analyze(&mut self, task: &Task) -> Result<AnalysisResult, OrcError> {
        let stack_hint = task.target_stack.as_deref().unwrap_or("");
        let prompt = Self::render(Role::Planner.system_prompt_template(), task, Some(stack_hint));

        let key = CacheKeyInput {
            model: &self.model_name,
            temperature_class: "low",
            prompt: &prompt,
            required_capability: "analyze",
            scope: &format!("task:{}", task.id),
        }
        .fingerprint();

        if let (Some(payload), true) = self.cache.lookup(&key) {
            if let Ok(cached) = serde_json::from_slice::<CachedAnalysis>(&payload) {
                return Ok(cached.into());
            }
        }

        let response = self.model.complete(&RoleRequest { role: Role::Planner, prompt })?;
        let result = parse_analysis(&response.text, stack_hint)?;

        let cached = CachedAnalysis::from(&result);
        if let Ok(payload) = serde_json::to_vec(&cached) {
            self.cache.store(&key, payload);
        }

        self.log.push(MemoryEntry {
            role: Role::Planner,
            phase: "analyze",
            text: response.text,
            keywords: Self::task_keywords(task),
        });

        Ok(result)
    }

    /// §4.8 step 2: produces the stepwise plan shown to a human approver.
    /// Not memoized: unlike analyze, the plan is meant to vary run over run
    /// even with an identical task, since it is what a human is approving.
    pub fn plan(&mut self, task: &Task, analysis: &AnalysisResult) -> Result<PlanResult, OrcError> {
        let relevant = self.log.relevant_to(Role::Planner, &Self::task_keywords(task));
        let memory_block = render_memory_block(&relevant);
        let prompt = format!(
            "{}\n\nComplexity: {:?}\nProposed stack: {}\n\nPrior relevant context:\n{memory_block}",
            Self::render(Role::Planner.system_prompt_template(), task, Some(analysis.stack.as_str())),
            analysis.complexity,
            analysis.stack.as_str(),
        );

        let response = self.model.complete(&RoleRequest { role: Role::Planner, prompt })?;
        self.log.push(MemoryEntry {
            role: Role::Planner,
            phase: "plan",
            text: response.text.clone(),
            keywords: Self::task_keywords(task),
        });

        Ok(PlanResult { plan_text: response.text })
    }

    /// §4.8 steps 4-6: code, test, review, with the bounded revision loop.
    /// Runs entirely after the external approval gate has released the run.
    pub fn code_test_review(&mut self, task: &Task, analysis: &AnalysisResult) -> Result<PipelineOutcome, OrcError> {
        let stack_spec = StackSpec::builtin(analysis.stack);
        let mut phase_timings = BTreeMap::new();
        let mut total_tokens = 0u32;
        let mut revision_count = 0u32;
        let mut review_notes: Option<String> = None;

        for review_round in 0..self.max_rounds {
            let code_started = Instant::now();
            let code_outcome = self.generate_validated_manifest(
                task,
                &stack_spec,
                Role::Implementer,
                review_notes.as_deref(),
                &mut total_tokens,
                &mut revision_count,
            )?;
            phase_timings.insert("code".to_string(), phase_timings.get("code").copied().unwrap_or_default() + code_started.elapsed());
            let manifest = match code_outcome {
                Some(manifest) => manifest,
                None => return Ok(PipelineOutcome::NeedsInfo(NeedsInfoReason::RevisionRoundsExhausted { phase: "code" })),
            };

            let test_started = Instant::now();
            let test_outcome = self.generate_validated_manifest(
                task,
                &stack_spec,
                Role::Tester,
                None,
                &mut total_tokens,
                &mut revision_count,
            )?;
            phase_timings.insert("test".to_string(), phase_timings.get("test").copied().unwrap_or_default() + test_started.elapsed());
            let test_manifest = match test_outcome {
                Some(manifest) => manifest,
                None => return Ok(PipelineOutcome::NeedsInfo(NeedsInfoReason::RevisionRoundsExhausted { phase: "test" })),
            };

            let review_started = Instant::now();
            let review_prompt = Self::render(Role::Reviewer.system_prompt_template(), task, Some(analysis.stack.as_str()));
            let response = self.model.complete(&RoleRequest { role: Role::Reviewer, prompt: review_prompt })?;
            total_tokens += response.estimated_tokens;
            phase_timings.insert("review".to_string(), phase_timings.get("review").copied().unwrap_or_default() + review_started.elapsed());

            let verdict = parse_verdict(&response.text);
            self.log.push(MemoryEntry {
                role: Role::Reviewer,
                phase: "review",
                text: response.text,
                keywords: Self::task_keywords(task),
            });

            match verdict {
                ReviewVerdict::Approved => {
                    return Ok(PipelineOutcome::Completed(PipelineResult {
                        manifest,
                        test_manifest,
                        review_verdict: ReviewVerdict::Approved,
                        revision_count,
                        phase_timings,
                        estimated_tokens: total_tokens,
                    }));
                }
                ReviewVerdict::ChangesRequired { notes } => {
                    tracing::info!(round = review_round, "review requested changes, looping to code");
                    review_notes = Some(notes);
                }
            }
        }

        Ok(PipelineOutcome::NeedsInfo(NeedsInfoReason::ReviewRoundsExhausted))
    }

    /// One role's generate-then-validate-then-revise cycle, shared between
    /// the code and test phases since both pass through C2/C3 the same way
    /// (§4.8 step 5: "the same manifest/guardrail pass is applied").
    fn generate_validated_manifest(
        &mut self,
        task: &Task,
        stack_spec: &StackSpec,
        role: Role,
        seed_notes: Option<&str>,
        total_tokens: &mut u32,
        revision_count: &mut u32,
    ) -> Result<Option<Vec<ManifestEntry>>, OrcError> {
        let mut notes = seed_notes.map(str::to_string);

        for attempt in 0..=self.max_revision_rounds {
            let mut prompt = Self::render(role.system_prompt_template(), task, Some(stack_spec.name.as_str()));
            if let Some(n) = &notes {
                prompt.push_str("\n\nRevision notes:\n");
                prompt.push_str(n);
            }

            let response = self.model.complete(&RoleRequest { role, prompt })?;
            *total_tokens += response.estimated_tokens;
            self.log.push(MemoryEntry {
                role,
                phase: "code_or_test",
                text: response.text.clone(),
                keywords: Self::task_keywords(task),
            });

            let parsed = orc_manifest::parse(&response.text, task.strict_requirements);
            let manifest = match parsed {
                Ok(manifest) => manifest,
                Err(e) => {
                    if attempt == self.max_revision_rounds {
                        return Ok(None);
                    }
                    *revision_count += 1;
                    notes = Some(format!("Manifest failed to parse: {e}"));
                    continue;
                }
            };

            let validation = orc_guardrails::validate(&manifest, stack_spec, &task.constraints);
            if validation.is_valid {
                return Ok(Some(manifest));
            }

            if attempt == self.max_revision_rounds {
                return Ok(None);
            }
            *revision_count += 1;
            notes = Some(build_revision_prompt(&task.description, &validation));
        }

        Ok(None)
    }
}

/// The JSON shape actually stored in the cache, since `StackTag`/
/// `ComplexityTag` are not natively `Serialize` on their own in this crate.
#[derive(serde::Serialize, serde::Deserialize)]
struct CachedAnalysis {
    complexity: String,
    stack: String,
    manifest_sketch: String,
}

impl From<&AnalysisResult> for CachedAnalysis {
    fn from(r: &AnalysisResult) -> Self {
        CachedAnalysis {
            complexity: format!("{:?}", r.complexity).to_lowercase(),
            stack: r.stack.as_str().to_string(),
            manifest_sketch: r.manifest_sketch.clone(),
        }
    }
}

impl From<CachedAnalysis> for AnalysisResult {
    fn from(c: CachedAnalysis) -> Self {
        AnalysisResult {
            complexity: ComplexityTag::parse(&c.complexity).unwrap_or(ComplexityTag::M),
            stack: StackTag::parse(&c.stack).unwrap_or(StackTag::Fastapi),
            manifest_sketch: c.manifest_sketch,
        }
    }
}

/// Parses the Planner's analyze-phase output: `complexity: <tag>` and
/// `stack: <tag>` lines, with everything else treated as the manifest
/// sketch.
fn parse_analysis(text: &str, stack_hint: &str) -> Result<AnalysisResult, OrcError> {
    let mut complexity = None;
    let mut stack = StackTag::parse(stack_hint);
    let mut sketch_lines = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("complexity:") {
            complexity = ComplexityTag::parse(rest);
        } else if let Some(rest) = line.strip_prefix("stack:") {
            if let Some(tag) = StackTag::parse(rest.trim()) {
                stack = Some(tag);
            }
        } else {
            sketch_lines.push(line);
        }
    }

    Ok(AnalysisResult {
        complexity: complexity.ok_or_else(|| OrcError::new(ErrorKind::ParseError, "planner output missing complexity tag"))?,
        stack: stack.ok_or_else(|| OrcError::new(ErrorKind::ParseError, "planner output missing a recognized stack tag"))?,
        manifest_sketch: sketch_lines.join("\n"),
    })
}

fn parse_verdict(text: &str) -> ReviewVerdict {
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("verdict:") {
            let rest = rest.trim();
            if rest == "approved" {
                return ReviewVerdict::Approved;
            }
            if rest == "changes_required" {
                let notes: String = text.lines().filter(|l| !l.starts_with("verdict:")).collect::<Vec<_>>().join("\n");
                return ReviewVerdict::ChangesRequired { notes };
            }
        }
    }
    ReviewVerdict::Approved
}

fn render_memory_block(entries: &[&MemoryEntry]) -> String {
    if entries.is_empty() {
        return "(none)".to_string();
    }
    entries.iter().map(|e| format!("[{}/{}] {}", e.role.tag(), e.phase, e.text)).collect::<Vec<_>>().join("\n---\n")
}
