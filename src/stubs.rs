//! Scripted adapters for exercising the runner and session without toolchains.

use crate::adapter::{AdapterSource, Artifact, LanguageAdapter};
use crate::compiler::{CompileFailure, PrepareError};
use crate::error::JudgeError;
use crate::executor::{ExecutionResult, ProcessSpec};
use crate::sandbox::Sandbox;
use crate::types::Language;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One canned answer to `execute`
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Finished(ExecutionResult),
    Fail(String),
}

impl ScriptedRun {
    pub fn output(stdout: &str) -> Self {
        ScriptedRun::Finished(ExecutionResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
            timed_out: false,
            execution_time_ms: 1,
        })
    }

    pub fn stderr(stderr: &str) -> Self {
        ScriptedRun::Finished(ExecutionResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(1),
            timed_out: false,
            execution_time_ms: 1,
        })
    }

    pub fn timeout() -> Self {
        ScriptedRun::Finished(ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            timed_out: true,
            execution_time_ms: 1,
        })
    }

    pub fn fail(message: &str) -> Self {
        ScriptedRun::Fail(message.to_string())
    }
}

#[derive(Debug, Default)]
struct Script {
    compile_error: Mutex<Option<String>>,
    runs: Mutex<VecDeque<ScriptedRun>>,
    preparations: AtomicUsize,
    executions: AtomicUsize,
}

/// Adapter that replays scripted runs in order. Clones share the script and counters.
#[derive(Debug, Clone)]
pub struct ScriptedAdapter {
    language: Language,
    script: Arc<Script>,
}

impl ScriptedAdapter {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            script: Arc::new(Script::default()),
        }
    }

    pub fn with_run(self, run: ScriptedRun) -> Self {
        self.script
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(run);
        self
    }

    pub fn with_compile_error(self, message: &str) -> Self {
        *self
            .script
            .compile_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
        self
    }

    pub fn preparations(&self) -> usize {
        self.script.preparations.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> usize {
        self.script.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageAdapter for ScriptedAdapter {
    fn language(&self) -> Language {
        self.language
    }

    async fn prepare(&self, _source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError> {
        self.script.preparations.fetch_add(1, Ordering::SeqCst);
        let compile_error = self
            .script
            .compile_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(message) = compile_error {
            return Err(PrepareError::Compile(CompileFailure::new(message)));
        }
        Ok(Artifact {
            run: ProcessSpec::new("scripted").current_dir(sandbox.working_dir()),
        })
    }

    async fn execute(
        &self,
        _artifact: &Artifact,
        _input: &str,
        _time_limit: Duration,
    ) -> Result<ExecutionResult> {
        self.script.executions.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(ScriptedRun::Finished(result)) => Ok(result),
            Some(ScriptedRun::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted run left")),
        }
    }
}

/// Adapter source over a fixed set of scripted adapters
#[derive(Debug, Clone, Default)]
pub struct StaticAdapterSource {
    adapters: Vec<ScriptedAdapter>,
}

impl StaticAdapterSource {
    pub fn new(adapters: impl IntoIterator<Item = ScriptedAdapter>) -> Self {
        Self {
            adapters: adapters.into_iter().collect(),
        }
    }
}

impl AdapterSource for StaticAdapterSource {
    fn adapter_for(&self, language: Language) -> Result<Box<dyn LanguageAdapter>, JudgeError> {
        self.adapters
            .iter()
            .find(|a| a.language == language)
            .map(|a| Box::new(a.clone()) as Box<dyn LanguageAdapter>)
            .ok_or(JudgeError::ToolchainUnavailable(language))
    }
}
