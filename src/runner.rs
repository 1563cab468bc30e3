use crate::adapter::{Artifact, LanguageAdapter};
use crate::compiler::CompileFailure;
use crate::config::NormalizationOptions;
use crate::error::JudgeError;
use crate::executor::ExecutionResult;
use crate::normalize::outputs_match;
use crate::transcript::Transcript;
use crate::types::{CaseResult, JudgingResult, TestCase, Verdict};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation, checked before each test case starts
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of the adapter's prepare step as the runner sees it
pub type BuildOutcome = Result<Artifact, CompileFailure>;

/// Drives one adapter over an ordered list of test cases
pub struct TestRunner<'a> {
    adapter: &'a dyn LanguageAdapter,
    time_limit: Duration,
    normalization: &'a NormalizationOptions,
    cancel: &'a CancelFlag,
}

impl<'a> TestRunner<'a> {
    pub fn new(
        adapter: &'a dyn LanguageAdapter,
        time_limit: Duration,
        normalization: &'a NormalizationOptions,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            adapter,
            time_limit,
            normalization,
            cancel,
        }
    }

    /// Judge each `(case_index, case)` exactly once, in order.
    ///
    /// A failed build marks every case `CompileError` without executing
    /// anything. Otherwise cases are independent: a failure on one never
    /// stops the next.
    pub async fn run(
        &self,
        build: &BuildOutcome,
        cases: &[(usize, &TestCase)],
        total_points: f64,
        transcript: &mut Transcript,
    ) -> Result<JudgingResult, JudgeError> {
        let artifact = match build {
            Ok(artifact) => artifact,
            Err(failure) => {
                let results = cases
                    .iter()
                    .enumerate()
                    .map(|(n, (index, case))| {
                        transcript.case_started(n + 1, case);
                        let result = CaseResult {
                            case_index: *index,
                            verdict: Verdict::CompileError,
                            points_awarded: 0.0,
                            actual_output: String::new(),
                            detail: None,
                        };
                        transcript.case_finished(&result);
                        result
                    })
                    .collect();
                return Ok(JudgingResult {
                    total_score: 0.0,
                    max_score: max_score(cases),
                    total_points,
                    cases: results,
                    compile_error: Some(failure.message.clone()),
                });
            }
        };

        let mut results = Vec::with_capacity(cases.len());
        for (n, (index, case)) in cases.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!(completed = n, "judging cancelled");
                return Err(JudgeError::Cancelled { completed: n });
            }

            transcript.case_started(n + 1, case);
            let outcome = self.adapter.execute(artifact, &case.input, self.time_limit).await;
            let (verdict, actual_output, detail) = classify(outcome, &case.expected_output, self.normalization);
            let points_awarded = if verdict.is_passed() { case.points } else { 0.0 };

            tracing::debug!(case = index, verdict = ?verdict, points = points_awarded, "test case judged");
            let result = CaseResult {
                case_index: *index,
                verdict,
                points_awarded,
                actual_output,
                detail,
            };
            transcript.case_finished(&result);
            results.push(result);
        }

        let awarded: f64 = results.iter().map(|r| r.points_awarded).sum();
        Ok(JudgingResult {
            total_score: awarded.clamp(0.0, total_points.max(0.0)),
            max_score: max_score(cases),
            total_points,
            cases: results,
            compile_error: None,
        })
    }
}

fn max_score(cases: &[(usize, &TestCase)]) -> f64 {
    cases.iter().map(|(_, case)| case.points).sum()
}

/// Verdict precedence: timeout, adapter error, stderr, non-zero exit,
/// wrong answer, then passed
pub fn classify(
    outcome: anyhow::Result<ExecutionResult>,
    expected: &str,
    normalization: &NormalizationOptions,
) -> (Verdict, String, Option<String>) {
    let execution = match outcome {
        Ok(execution) => execution,
        Err(e) => return (Verdict::RuntimeError, String::new(), Some(format!("{:#}", e))),
    };
    let actual = execution.stdout.trim().to_string();

    if execution.timed_out {
        return (
            Verdict::Timeout,
            actual,
            Some(format!("Time limit exceeded after {} ms", execution.execution_time_ms)),
        );
    }
    let stderr = execution.stderr.trim();
    if !stderr.is_empty() {
        return (Verdict::RuntimeError, actual, Some(stderr.to_string()));
    }
    if execution.exit_code != Some(0) {
        let detail = match execution.exit_code {
            Some(code) => format!("Process exited with status {}", code),
            None => "Process terminated by a signal".to_string(),
        };
        return (Verdict::RuntimeError, actual, Some(detail));
    }
    if outputs_match(&execution.stdout, expected, normalization) {
        (Verdict::Passed, actual, None)
    } else {
        (Verdict::WrongAnswer, actual, None)
    }
}
