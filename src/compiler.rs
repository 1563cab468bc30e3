use crate::executor::ProcessSpec;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::time::{timeout, Duration};

/// Diagnostics from a failed build; terminal for the whole submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub message: String,
}

impl CompileFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why an adapter could not produce a runnable artifact
#[derive(Debug)]
pub enum PrepareError {
    /// The candidate's code did not build
    Compile(CompileFailure),
    /// The judge could not write files or start the compiler
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for PrepareError {
    fn from(err: anyhow::Error) -> Self {
        PrepareError::Internal(err)
    }
}

/// Runs a toolchain compiler under a wall clock limit
#[derive(Debug, Clone)]
pub struct Compiler {
    timeout: Duration,
}

impl Compiler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `spec` to completion. A non-zero exit or a timeout is a
    /// `CompileFailure`; failing to start the compiler is internal.
    pub async fn compile(&self, spec: &ProcessSpec) -> Result<(), PrepareError> {
        let start = Instant::now();
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.workdir {
            cmd.current_dir(dir);
        }

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(output) => output
                .with_context(|| format!("Failed to execute {}", spec.program.display()))?,
            Err(_) => {
                return Err(PrepareError::Compile(CompileFailure::new(format!(
                    "compilation timed out after {} ms",
                    self.timeout.as_millis()
                ))));
            }
        };

        tracing::debug!(
            compiler = %spec.program.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = ?output.status.code(),
            "compiler finished"
        );

        if !output.status.success() {
            // csc and mcs report diagnostics on stdout
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(PrepareError::Compile(CompileFailure::new(message)));
        }

        Ok(())
    }
}

/// Write a source file into the scratch directory
pub async fn write_source(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("Failed to write source file {}", path.display()))?;
    Ok(path)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_build_is_ok() {
        let spec = ProcessSpec::new("sh").args(["-c", "exit 0"]);
        assert!(Compiler::new(Duration::from_secs(5)).compile(&spec).await.is_ok());
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let spec = ProcessSpec::new("sh").args(["-c", "echo 'error: expected ;' >&2; exit 1"]);
        match Compiler::new(Duration::from_secs(5)).compile(&spec).await {
            Err(PrepareError::Compile(failure)) => assert_eq!(failure.message, "error: expected ;"),
            other => panic!("expected compile failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn falls_back_to_stdout_diagnostics() {
        let spec = ProcessSpec::new("sh").args(["-c", "echo 'Solution.cs(3,1): error CS1002'; exit 1"]);
        match Compiler::new(Duration::from_secs(5)).compile(&spec).await {
            Err(PrepareError::Compile(failure)) => assert!(failure.message.contains("CS1002")),
            other => panic!("expected compile failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_compiler_is_a_compile_failure() {
        let spec = ProcessSpec::new("sleep").arg("5");
        match Compiler::new(Duration::from_millis(100)).compile(&spec).await {
            Err(PrepareError::Compile(failure)) => assert!(failure.message.contains("timed out")),
            other => panic!("expected compile failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_compiler_is_internal() {
        let spec = ProcessSpec::new("/no/such/compiler");
        assert!(matches!(
            Compiler::new(Duration::from_secs(1)).compile(&spec).await,
            Err(PrepareError::Internal(_))
        ));
    }
}
