use crate::activity::{Activity, ActivityEntry, ActivityLog};
use crate::adapter::{AdapterRegistry, AdapterSource};
use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::runner::CancelFlag;
use crate::session::{JudgingSession, SessionSettings};
use crate::toolchain::ToolchainRegistry;
use crate::transcript::Transcript;
use crate::types::*;
use std::sync::Arc;

/// A finished session: the score plus the human-readable account of it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub result: JudgingResult,
    pub transcript: Transcript,
}

/// Main judge engine: owns configuration and the adapter source, and runs one
/// session per submission
pub struct Judge {
    config: JudgeConfig,
    toolchains: Arc<ToolchainRegistry>,
    adapters: Box<dyn AdapterSource>,
    activity: Option<ActivityLog>,
}

impl Judge {
    /// Judge backed by the process-wide toolchain registry, discovered on first use
    pub async fn new(config: JudgeConfig) -> Self {
        let toolchains = ToolchainRegistry::global(config.probe_timeout()).await;
        Self::with_registry(config, toolchains)
    }

    pub fn with_registry(config: JudgeConfig, toolchains: Arc<ToolchainRegistry>) -> Self {
        let adapters = AdapterRegistry::new(toolchains.clone(), &config);
        let activity = config.activity_log_path().map(ActivityLog::new);
        Self {
            config,
            toolchains,
            adapters: Box::new(adapters),
            activity,
        }
    }

    /// Judge over an arbitrary adapter source; `toolchains()` reports nothing
    pub fn with_source(config: JudgeConfig, adapters: impl AdapterSource + 'static) -> Self {
        let activity = config.activity_log_path().map(ActivityLog::new);
        Self {
            config,
            toolchains: Arc::new(ToolchainRegistry::default()),
            adapters: Box::new(adapters),
            activity,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn toolchains(&self) -> &ToolchainRegistry {
        &self.toolchains
    }

    fn settings(&self) -> SessionSettings {
        SessionSettings {
            case_timeout: self.config.case_timeout(),
            max_source_bytes: self.config.max_source_bytes,
            normalization: self.config.normalization.clone(),
        }
    }

    async fn run_session(
        &self,
        problem: &Problem,
        submission: &Submission,
        mode: RunMode,
        cancel: &CancelFlag,
    ) -> (Result<JudgingResult, JudgeError>, Transcript) {
        let mut session = JudgingSession::new(problem, submission, mode);
        let result = session.run(self.adapters.as_ref(), &self.settings(), cancel).await;
        (result, session.into_transcript())
    }

    pub async fn run(
        &self,
        problem: &Problem,
        submission: &Submission,
        mode: RunMode,
        cancel: &CancelFlag,
    ) -> Result<SessionOutcome, JudgeError> {
        let (result, transcript) = self.run_session(problem, submission, mode, cancel).await;
        Ok(SessionOutcome {
            result: result?,
            transcript,
        })
    }

    /// Feedback run over all cases, or only the given case indices
    pub async fn run_trial(
        &self,
        problem: &Problem,
        submission: &Submission,
        cases: Option<Vec<usize>>,
    ) -> Result<SessionOutcome, JudgeError> {
        self.run(problem, submission, RunMode::Trial { cases }, &CancelFlag::new())
            .await
    }

    /// The recorded run over every case
    pub async fn submit_final(
        &self,
        problem: &Problem,
        submission: &Submission,
    ) -> Result<SessionOutcome, JudgeError> {
        self.run(problem, submission, RunMode::Final, &CancelFlag::new())
            .await
    }

    /// Process a judge request and return results. Errors are folded into
    /// the response status.
    pub async fn judge(&self, request: JudgeRequest) -> JudgeResponse {
        let fingerprint = request.submission.fingerprint();
        let recorded = request.mode.is_final();
        let team = request.team.as_deref().filter(|_| recorded);

        if let Some(team) = team {
            let entry = ActivityEntry::new(team, Activity::Submitted, &request.problem.id, "pending")
                .round(request.round.as_deref())
                .details(format!("{} submission {}", request.submission.language, fingerprint));
            self.record(entry).await;
        }

        let (result, transcript) = self
            .run_session(
                &request.problem,
                &request.submission,
                request.mode.clone(),
                &CancelFlag::new(),
            )
            .await;

        let response = match result {
            Ok(result) => JudgeResponse {
                success: true,
                status: OverallStatus::from_result(&result),
                result: Some(result),
                transcript: transcript.into_lines(),
                error: None,
                fingerprint,
            },
            Err(e) => {
                if e.is_internal() {
                    tracing::error!(error = %format!("{:#}", e), "judging failed");
                } else {
                    tracing::info!(error = %e, "request rejected");
                }
                JudgeResponse {
                    success: false,
                    status: e.status(),
                    result: None,
                    transcript: transcript.into_lines(),
                    error: Some(format!("{:#}", e)),
                    fingerprint,
                }
            }
        };

        if let Some(team) = team {
            let status = serde_json::to_value(response.status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let entry = match &response.result {
                Some(result) => ActivityEntry::new(team, Activity::Completed, &request.problem.id, status)
                    .score(result.total_score, result.total_points)
                    .details(format!(
                        "passed {} of {} test cases",
                        result.passed_count(),
                        result.cases.len()
                    )),
                None => ActivityEntry::new(team, Activity::Rejected, &request.problem.id, status)
                    .details(response.error.clone().unwrap_or_default()),
            };
            self.record(entry.round(request.round.as_deref())).await;
        }

        response
    }

    /// Activity logging never fails a submission
    async fn record(&self, entry: ActivityEntry) {
        if let Some(log) = &self.activity {
            if let Err(e) = log.append(&entry).await {
                tracing::warn!(error = %format!("{:#}", e), path = %log.path().display(), "activity log write failed");
            }
        }
    }
}

/// Decode a JSON judge request, reporting unknown languages as such rather
/// than as a malformed document
pub fn parse_request(text: &str) -> Result<JudgeRequest, JudgeError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| JudgeError::InvalidRequest(format!("malformed JSON: {}", e)))?;
    if let Some(tag) = value.pointer("/submission/language").and_then(|v| v.as_str()) {
        tag.parse::<Language>()?;
    }
    serde_json::from_value(value).map_err(|e| JudgeError::InvalidRequest(e.to_string()))
}

/// Response for a request that never reached a session
pub fn rejected_response(error: &JudgeError) -> JudgeResponse {
    JudgeResponse {
        success: false,
        status: error.status(),
        result: None,
        transcript: Vec::new(),
        error: Some(error.to_string()),
        fingerprint: String::new(),
    }
}
