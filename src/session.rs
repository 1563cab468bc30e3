use crate::adapter::AdapterSource;
use crate::compiler::PrepareError;
use crate::config::NormalizationOptions;
use crate::error::JudgeError;
use crate::runner::{BuildOutcome, CancelFlag, TestRunner};
use crate::sandbox::Sandbox;
use crate::transcript::Transcript;
use crate::types::{JudgingResult, Problem, RunMode, Submission, TestCase};
use std::time::{Duration, Instant};

/// Where a session is in its one pass through judging
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    /// Sandbox setup and compilation
    Preparing,
    /// Test runner loop
    Executing,
    Scored(JudgingResult),
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Preparing => "preparing",
            SessionState::Executing => "executing",
            SessionState::Scored(_) => "scored",
        }
    }
}

/// Limits a session runs under
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub case_timeout: Duration,
    pub max_source_bytes: usize,
    pub normalization: NormalizationOptions,
}

/// One submission judged against one problem.
///
/// Trial runs and final submissions use the same machine; only `mode`
/// differs, and it only decides which cases are judged.
#[derive(Debug)]
pub struct JudgingSession<'a> {
    problem: &'a Problem,
    submission: &'a Submission,
    mode: RunMode,
    state: SessionState,
    transcript: Transcript,
}

impl<'a> JudgingSession<'a> {
    pub fn new(problem: &'a Problem, submission: &'a Submission, mode: RunMode) -> Self {
        Self {
            problem,
            submission,
            mode,
            state: SessionState::Idle,
            transcript: Transcript::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// The cases this session judges, with their indices in the problem
    fn selected_cases(&self) -> Result<Vec<(usize, &'a TestCase)>, JudgeError> {
        let all = &self.problem.test_cases;
        match &self.mode {
            RunMode::Trial { cases: Some(indices) } => indices
                .iter()
                .map(|&index| {
                    all.get(index)
                        .map(|case| (index, case))
                        .ok_or(JudgeError::InvalidSelection { index, len: all.len() })
                })
                .collect(),
            _ => Ok(all.iter().enumerate().collect()),
        }
    }

    /// Drive the session from `Idle` to `Scored`.
    ///
    /// Request problems (bad problem data, unknown selection, oversized
    /// source, missing toolchain) are rejected before any process starts.
    pub async fn run(
        &mut self,
        adapters: &dyn AdapterSource,
        settings: &SessionSettings,
        cancel: &CancelFlag,
    ) -> Result<JudgingResult, JudgeError> {
        if self.state != SessionState::Idle {
            return Err(JudgeError::InvalidState(self.state.name()));
        }
        let start = Instant::now();
        let language = self.submission.language;

        self.problem.validate()?;
        let cases = self.selected_cases()?;
        let size = self.submission.source.len();
        if size > settings.max_source_bytes {
            return Err(JudgeError::SourceTooLarge {
                size,
                limit: settings.max_source_bytes,
            });
        }
        let adapter = adapters.adapter_for(language)?;

        self.state = SessionState::Preparing;
        let sandbox = Sandbox::new()?;
        if language.is_compiled() {
            self.transcript.compile_started(language.tag());
        }
        let build: BuildOutcome = match adapter.prepare(&self.submission.source, &sandbox).await {
            Ok(artifact) => {
                if language.is_compiled() {
                    self.transcript.compile_succeeded();
                }
                Ok(artifact)
            }
            Err(PrepareError::Compile(failure)) => {
                tracing::info!(language = %language, "submission failed to compile");
                self.transcript.compile_failed(&failure.message);
                Err(failure)
            }
            Err(PrepareError::Internal(e)) => {
                return Err(JudgeError::Internal(e.context("Failed to prepare submission")));
            }
        };

        self.state = SessionState::Executing;
        let time_limit = self
            .problem
            .time_limit_ms
            .map(Duration::from_millis)
            .unwrap_or(settings.case_timeout);
        let runner = TestRunner::new(adapter.as_ref(), time_limit, &settings.normalization, cancel);
        let result = runner
            .run(&build, &cases, self.problem.total_points, &mut self.transcript)
            .await?;

        if let Err(e) = sandbox.cleanup() {
            tracing::warn!(error = %format!("{:#}", e), "sandbox cleanup failed");
        }

        self.transcript.summary(
            result.passed_count(),
            result.cases.len(),
            result.total_score,
            result.total_points,
        );
        tracing::info!(
            problem = %self.problem.id,
            language = %language,
            final_submission = self.mode.is_final(),
            score = result.total_score,
            total_points = result.total_points,
            passed = result.passed_count(),
            cases = result.cases.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "submission judged"
        );
        self.state = SessionState::Scored(result.clone());
        Ok(result)
    }
}
