//! Language adapters.
//!
//! An adapter turns candidate source into a runnable artifact inside the
//! session's sandbox, then runs that artifact once per test case. The runner
//! and session never branch on language; they only see this trait.

pub mod languages;
pub mod registry;

use crate::compiler::{Compiler, PrepareError};
use crate::error::JudgeError;
use crate::executor::{ExecutionResult, Executor, ProcessSpec};
use crate::sandbox::Sandbox;
use crate::toolchain::Toolchain;
use crate::types::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use registry::AdapterRegistry;

/// Command line that runs a prepared submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub run: ProcessSpec,
}

/// Prepare/execute contract for one language family
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    /// Write the harness into `sandbox` and build it if the family compiles
    async fn prepare(&self, source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError>;

    /// Run the artifact once, feeding `input` on stdin
    async fn execute(
        &self,
        artifact: &Artifact,
        input: &str,
        time_limit: Duration,
    ) -> Result<ExecutionResult>;
}

/// Picks the adapter for a submission's language
pub trait AdapterSource: Send + Sync {
    fn adapter_for(&self, language: Language) -> Result<Box<dyn LanguageAdapter>, JudgeError>;
}

/// What every concrete adapter needs: its toolchain and the process helpers
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub toolchain: Toolchain,
    pub compiler: Compiler,
    pub executor: Executor,
}

impl AdapterContext {
    pub async fn run(&self, artifact: &Artifact, input: &str, time_limit: Duration) -> Result<ExecutionResult> {
        self.executor
            .with_time_limit(time_limit)
            .execute(&artifact.run, input)
            .await
    }

    /// Command that starts a built artifact, going through the runtime VM if the family has one
    pub fn launcher(&self) -> ProcessSpec {
        match &self.toolchain.runtime {
            Some(runtime) => runtime.spec(),
            None => self.toolchain.primary.spec(),
        }
    }
}
