use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;

const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A fully resolved command line: program, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub workdir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    fn command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Result of code execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed or died from a signal
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub execution_time_ms: u64,
}

/// Runs one process per call under a wall clock limit
#[derive(Debug, Clone)]
pub struct Executor {
    time_limit: Duration,
    max_output_bytes: usize,
}

impl Executor {
    pub fn new(time_limit: Duration, max_output_bytes: usize) -> Self {
        Self {
            time_limit,
            max_output_bytes,
        }
    }

    pub fn with_time_limit(&self, time_limit: Duration) -> Self {
        Self {
            time_limit,
            max_output_bytes: self.max_output_bytes,
        }
    }

    /// Execute `spec`, feeding `input` on stdin.
    ///
    /// Only the process itself runs against the time limit. Once it exits,
    /// anything it left running in its process group is killed so the output
    /// pipes close. Exceeding the limit kills the whole group and yields
    /// `timed_out = true`. Only a failure to start the process is an `Err`.
    pub async fn execute(&self, spec: &ProcessSpec, input: &str) -> Result<ExecutionResult> {
        let start_time = Instant::now();

        let mut cmd = spec.command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start process {}", spec.program.display()))?;
        let group = child.id();

        // Closing stdin after the write lets programs that read to EOF finish
        if let Some(mut stdin) = child.stdin.take() {
            let data = input.as_bytes().to_vec();
            tokio::spawn(async move {
                let _ = stdin.write_all(&data).await;
                let _ = stdin.shutdown().await;
            });
        }

        let stdout = child.stdout.take().context("stdout was not captured")?;
        let stderr = child.stderr.take().context("stderr was not captured")?;
        let limit = self.max_output_bytes;
        let stdout_task = tokio::spawn(drain(stdout, limit));
        let stderr_task = tokio::spawn(drain(stderr, limit));

        let wait_result = tokio::time::timeout(self.time_limit, child.wait()).await;
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        match wait_result {
            Ok(status) => {
                let status = status.context("Failed to wait for process")?;
                kill_process_group(group);
                let stdout_buf = collect(stdout_task).await;
                let stderr_buf = collect(stderr_task).await;
                Ok(ExecutionResult {
                    stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                    exit_code: status.code(),
                    timed_out: false,
                    execution_time_ms,
                })
            }
            Err(_) => {
                kill_process_group(group);
                let _ = child.kill().await;
                let _ = child.wait().await;
                stdout_task.abort();
                stderr_task.abort();
                tracing::debug!(
                    program = %spec.program.display(),
                    limit_ms = self.time_limit.as_millis() as u64,
                    "process killed after time limit"
                );
                Ok(ExecutionResult {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: None,
                    timed_out: true,
                    execution_time_ms,
                })
            }
        }
    }
}

/// SIGKILL every process left in the group led by `leader`
#[cfg(unix)]
fn kill_process_group(leader: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = leader.and_then(|pid| i32::try_from(pid).ok()) {
        // ESRCH just means nothing was left behind
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_leader: Option<u32>) {}

/// Wait for a drain task. Stragglers that escaped the process group can keep
/// a pipe open, so the wait is bounded.
async fn collect(mut task: JoinHandle<Vec<u8>>) -> Vec<u8> {
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(_)) => Vec::new(),
        Err(_) => {
            task.abort();
            tracing::warn!("output pipe still open after process exit");
            Vec::new()
        }
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes
async fn drain<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> Vec<u8> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    kept
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor(ms: u64) -> Executor {
        Executor::new(Duration::from_millis(ms), 1024)
    }

    #[tokio::test]
    async fn feeds_stdin_and_captures_stdout() {
        let result = executor(5_000)
            .execute(&ProcessSpec::new("cat"), "hello\nworld\n")
            .await
            .unwrap();
        assert_eq!(result.exit_code, Some(0));
        assert!(!result.timed_out);
        assert_eq!(result.stdout, "hello\nworld\n");
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn captures_stderr_and_exit_code() {
        let spec = ProcessSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let result = executor(5_000).execute(&spec, "").await.unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn kills_process_after_time_limit() {
        let spec = ProcessSpec::new("sh").args(["-c", "while true; do :; done"]);
        let start = Instant::now();
        let result = executor(200).execute(&spec, "").await.unwrap();
        assert!(result.timed_out);
        assert_eq!(result.exit_code, None);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    /// Running means present in /proc and not a zombie
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid.trim())) {
            Ok(stat) => !stat.rsplit(')').next().unwrap_or("").trim_start().starts_with('Z'),
            Err(_) => false,
        }
    }

    #[tokio::test]
    async fn background_child_does_not_hold_output_open() {
        let spec = ProcessSpec::new("sh").args(["-c", "sleep 30 & echo 1"]);
        let start = Instant::now();
        let result = executor(5_000).execute(&spec, "").await.unwrap();
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "1");
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn background_child_is_killed_after_exit() {
        let spec = ProcessSpec::new("sh").args(["-c", "sleep 30 & echo $!"]);
        let result = executor(5_000).execute(&spec, "").await.unwrap();
        let pid = result.stdout.trim().to_string();
        assert!(!pid.is_empty());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!is_running(&pid), "background sleep {} survived", pid);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn time_limit_kills_the_whole_group() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("bg.pid");
        let script = format!("sleep 30 & echo $! > {}; while :; do :; done", pid_file.display());
        let spec = ProcessSpec::new("sh").args(["-c".to_string(), script]);
        let result = executor(300).execute(&spec, "").await.unwrap();
        assert!(result.timed_out);
        tokio::time::sleep(Duration::from_millis(200)).await;
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!is_running(&pid), "background sleep {} survived", pid.trim());
    }

    #[tokio::test]
    async fn truncates_large_output() {
        let spec = ProcessSpec::new("sh").args(["-c", "yes | head -c 5000"]);
        let result = executor(5_000).execute(&spec, "").await.unwrap();
        assert_eq!(result.stdout.len(), 1024);
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("pwd").current_dir(dir.path());
        let result = executor(5_000).execute(&spec, "").await.unwrap();
        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let err = executor(1_000)
            .execute(&ProcessSpec::new("/definitely/not/here"), "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to start process"));
    }
}
