//! Discovery of the interpreters and compilers installed on the host.
//!
//! Each language family has an ordered list of candidate executables. The
//! first candidate that resolves on `PATH` and answers its version flag with
//! a zero exit code wins; later alternates are not tried. A family with no
//! working candidate is simply absent from the registry.

use crate::executor::ProcessSpec;
use crate::types::Language;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

static GLOBAL_REGISTRY: OnceCell<Arc<ToolchainRegistry>> = OnceCell::const_new();

/// An executable plus arguments that always precede the caller's own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub path: PathBuf,
    pub leading_args: Vec<String>,
}

impl Tool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn spec(&self) -> ProcessSpec {
        ProcessSpec::new(&self.path).args(&self.leading_args)
    }
}

/// Interpreter or compiler for a family, plus the VM some families run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    pub primary: Tool,
    pub runtime: Option<Tool>,
}

impl Toolchain {
    pub fn new(primary: Tool) -> Self {
        Self {
            primary,
            runtime: None,
        }
    }

    pub fn with_runtime(mut self, runtime: Tool) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

/// Read-only map from language family to its discovered toolchain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolchainRegistry {
    toolchains: BTreeMap<Language, Toolchain>,
}

impl ToolchainRegistry {
    pub fn from_toolchains(entries: impl IntoIterator<Item = (Language, Toolchain)>) -> Self {
        Self {
            toolchains: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, language: Language) -> Option<&Toolchain> {
        self.toolchains.get(&language)
    }

    pub fn is_available(&self, language: Language) -> bool {
        self.toolchains.contains_key(&language)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.toolchains.keys().copied()
    }

    /// Check the host for every supported family
    pub async fn discover(probe_timeout: Duration) -> Self {
        let checks = Language::ALL
            .iter()
            .map(|&language| async move { (language, discover_family(language, probe_timeout).await) });
        let found = futures::future::join_all(checks).await;

        let registry = Self::from_toolchains(
            found
                .into_iter()
                .filter_map(|(language, toolchain)| toolchain.map(|t| (language, t))),
        );
        tracing::info!(
            languages = ?registry.languages().map(Language::tag).collect::<Vec<_>>(),
            "toolchain discovery finished"
        );
        registry
    }

    /// Process-wide registry, discovered on first use and shared afterwards
    pub async fn global(probe_timeout: Duration) -> Arc<ToolchainRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| async move { Arc::new(Self::discover(probe_timeout).await) })
            .await
            .clone()
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    program: &'static str,
    leading_args: &'static [&'static str],
    version_flag: &'static str,
}

const fn candidate(program: &'static str, version_flag: &'static str) -> Candidate {
    Candidate {
        program,
        leading_args: &[],
        version_flag,
    }
}

fn primary_candidates(language: Language) -> Vec<Candidate> {
    let windows = cfg!(windows);
    match language {
        Language::Python if windows => vec![candidate("python", "--version"), candidate("py", "--version")],
        Language::Python => vec![candidate("python", "--version"), candidate("python2", "--version")],
        Language::Python3 if windows => vec![
            candidate("python3", "--version"),
            Candidate {
                program: "py",
                leading_args: &["-3"],
                version_flag: "--version",
            },
        ],
        Language::Python3 => vec![candidate("python3", "--version")],
        Language::Cpp => vec![candidate("g++", "--version"), candidate("clang++", "--version")],
        Language::C => vec![candidate("gcc", "--version"), candidate("clang", "--version")],
        Language::Java => vec![candidate("javac", "-version")],
        Language::CSharp => vec![candidate("csc", "-version"), candidate("mcs", "--version")],
    }
}

/// Families whose artifacts need a separate VM to run
fn runtime_candidates(language: Language) -> Option<Vec<Candidate>> {
    match language {
        Language::Java => Some(vec![candidate("java", "-version")]),
        // csc output runs natively on Windows
        Language::CSharp if !cfg!(windows) => Some(vec![candidate("mono", "--version")]),
        _ => None,
    }
}

async fn discover_family(language: Language, probe_timeout: Duration) -> Option<Toolchain> {
    let Some(primary) = first_working(&primary_candidates(language), probe_timeout).await else {
        tracing::debug!(language = %language, "no toolchain found");
        return None;
    };
    let mut toolchain = Toolchain::new(primary);
    if let Some(runtimes) = runtime_candidates(language) {
        match first_working(&runtimes, probe_timeout).await {
            Some(runtime) => toolchain = toolchain.with_runtime(runtime),
            None => {
                tracing::debug!(language = %language, "compiler found but no runtime");
                return None;
            }
        }
    }
    tracing::info!(language = %language, path = %toolchain.primary.path.display(), "toolchain available");
    Some(toolchain)
}

async fn first_working(candidates: &[Candidate], probe_timeout: Duration) -> Option<Tool> {
    for candidate in candidates {
        if let Some(tool) = probe(candidate, probe_timeout).await {
            return Some(tool);
        }
    }
    None
}

async fn probe(candidate: &Candidate, probe_timeout: Duration) -> Option<Tool> {
    let path = which::which(candidate.program).ok()?;
    let tool = Tool {
        path,
        leading_args: candidate.leading_args.iter().map(|s| s.to_string()).collect(),
    };

    let mut cmd = tokio::process::Command::new(&tool.path);
    cmd.args(&tool.leading_args)
        .arg(candidate.version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(probe_timeout, cmd.status()).await {
        Ok(Ok(status)) if status.success() => Some(tool),
        Ok(Ok(status)) => {
            tracing::debug!(program = candidate.program, code = ?status.code(), "version check failed");
            None
        }
        Ok(Err(e)) => {
            tracing::debug!(program = candidate.program, error = %e, "version check could not start");
            None
        }
        Err(_) => {
            tracing::debug!(program = candidate.program, "version check timed out");
            None
        }
    }
}
