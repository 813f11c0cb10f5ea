//! Smoke-test runner: executes each step in order and renders the transcript

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::ProxyBackend;
use crate::config::{
    get_message, Language, ScriptProfile, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
};
use crate::error::SmokeError;
use crate::steps::{self, Step};

const HEAVY_RULE_WIDTH: usize = 50;
const LIGHT_RULE_WIDTH: usize = 30;

/// Configuration for the SmokeHarness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub lang: Language,
    pub profile: ScriptProfile,
    pub chat_model: String,
    pub embedding_model: String,
    /// Steps to run; the others print nothing
    pub steps: Vec<Step>,
    /// Query the proxy's health route before the first step
    pub health_check: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            lang: Language::French,
            profile: ScriptProfile::Python,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            steps: Step::ALL.to_vec(),
            health_check: false,
        }
    }
}

impl HarnessConfig {
    /// Create a new HarnessConfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Set language
    pub fn with_lang(mut self, lang: Language) -> Self {
        self.lang = lang;
        self
    }

    /// Set request profile
    pub fn with_profile(mut self, profile: ScriptProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the model used by the chat and streaming steps
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Set the model used by the embeddings step
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Restrict the run to the given steps
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    /// Enable or disable the health check
    pub fn with_health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    fn runs(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Passed,
    Failed(String),
}

impl StepOutcome {
    fn failed(err: &SmokeError) -> Self {
        Self::Failed(err.to_string())
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Per-step record of one run. Never turned into an exit code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeReport {
    pub health: Option<StepOutcome>,
    pub steps: Vec<StepReport>,
}

impl SmokeReport {
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.outcome)
    }

    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.passed()
    }
}

/// Runs the smoke-test steps against a backend.
///
/// Every step runs to completion before the next starts, and a failing step
/// never prevents the following ones. The harness holds no state between
/// runs: the same backend answers produce the same transcript.
pub struct SmokeHarness<B> {
    backend: B,
    config: HarnessConfig,
}

impl<B: ProxyBackend> SmokeHarness<B> {
    /// Create a new SmokeHarness
    pub fn new(backend: B, config: HarnessConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run every configured step, writing the transcript to `out`.
    ///
    /// Step failures are rendered inline and recorded in the report; only a
    /// failure to write to `out` aborts the run.
    pub async fn run<W>(&self, out: &mut W) -> io::Result<SmokeReport>
    where
        W: Write + ?Sized,
    {
        let mut report = SmokeReport::default();
        info!(
            lang = self.config.lang.as_str(),
            profile = self.config.profile.as_str(),
            steps = self.config.steps.len(),
            "smoke test started"
        );

        self.print_header(out)?;

        if self.config.health_check {
            report.health = Some(self.run_health(out).await?);
        }

        for step in Step::ALL {
            if !self.config.runs(step) {
                continue;
            }
            let outcome = self.run_step(step, out).await?;
            report.steps.push(StepReport { step, outcome });
        }

        self.print_footer(out)?;

        info!(
            passed = report.passed(),
            failed = report.failed(),
            "smoke test finished"
        );
        Ok(report)
    }

    fn msg(&self, key: &'static str) -> &'static str {
        get_message(key, self.config.lang)
    }

    fn print_header<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", "=".repeat(HEAVY_RULE_WIDTH))?;
        writeln!(out, "  {}", self.msg("title"))?;
        writeln!(out, "{}", "=".repeat(HEAVY_RULE_WIDTH))?;
        writeln!(out)
    }

    fn print_footer<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", "=".repeat(HEAVY_RULE_WIDTH))?;
        writeln!(out, "  {}", self.msg("finished"))?;
        writeln!(out, "{}", "=".repeat(HEAVY_RULE_WIDTH))?;
        out.flush()
    }

    fn print_banner<W: Write + ?Sized>(
        &self,
        out: &mut W,
        number: usize,
        key: &'static str,
    ) -> io::Result<()> {
        writeln!(out, "{}. {}:", number, self.msg(key))?;
        writeln!(out, "{}", "-".repeat(LIGHT_RULE_WIDTH))
    }

    fn print_error<W: Write + ?Sized>(
        &self,
        out: &mut W,
        step: &str,
        err: &SmokeError,
    ) -> io::Result<StepOutcome> {
        warn!(step, error = %err, "step failed");
        writeln!(out, "  {}: {}", self.msg("error"), err)?;
        Ok(StepOutcome::failed(err))
    }

    async fn run_health<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<StepOutcome> {
        self.print_banner(out, 0, "health_banner")?;

        let outcome = match self.backend.health().await {
            Ok(health) => {
                writeln!(out, "  {}: {}", self.msg("status"), health.status)?;
                StepOutcome::Passed
            }
            Err(e) => self.print_error(out, "health", &e)?,
        };

        writeln!(out)?;
        Ok(outcome)
    }

    async fn run_step<W: Write + ?Sized>(&self, step: Step, out: &mut W) -> io::Result<StepOutcome> {
        self.print_banner(out, step.number(), step.banner_key())?;
        let profile = self.config.profile;

        let outcome = match step {
            Step::Models => match steps::list_models(&self.backend).await {
                Ok(models) => {
                    for model in &models {
                        writeln!(out, "  - {}", model)?;
                    }
                    StepOutcome::Passed
                }
                Err(e) => self.print_error(out, step.name(), &e)?,
            },
            Step::Chat => {
                let request = profile.chat_request(&self.config.chat_model);
                match steps::chat_completion(&self.backend, &request).await {
                    Ok(text) => {
                        writeln!(out, "  {}: {}", self.msg("reply"), text)?;
                        StepOutcome::Passed
                    }
                    Err(e) => {
                        let outcome = self.print_error(out, step.name(), &e)?;
                        writeln!(out, "  {}", self.msg("auth_hint"))?;
                        outcome
                    }
                }
            }
            Step::Embeddings => {
                let request = profile.embedding_request(&self.config.embedding_model);
                match steps::embeddings(&self.backend, &request).await {
                    Ok(dimensions) => {
                        writeln!(
                            out,
                            "  {}: {} {}",
                            self.msg("embedding_created"),
                            dimensions,
                            self.msg("dimensions")
                        )?;
                        StepOutcome::Passed
                    }
                    Err(e) => self.print_error(out, step.name(), &e)?,
                }
            }
            Step::Streaming => {
                let request = profile.stream_request(&self.config.chat_model);
                match steps::open_stream(&self.backend, &request).await {
                    Ok(stream) => {
                        write!(out, "  {}: ", self.msg("streaming"))?;
                        out.flush()?;

                        let result = steps::streaming_chat(stream, out).await;
                        // Partial fragments stay on the line; the error goes below them
                        writeln!(out)?;
                        match result {
                            Ok(_) => StepOutcome::Passed,
                            Err(e) => self.print_error(out, step.name(), &e)?,
                        }
                    }
                    Err(e) => self.print_error(out, step.name(), &e)?,
                }
            }
        };

        writeln!(out)?;
        Ok(outcome)
    }
}
