use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output comparison options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationOptions {
    /// Treat `\r\n` as `\n`
    pub normalize_crlf: bool,
    /// Collapse runs of whitespace inside each line
    pub ignore_extra_whitespace: bool,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        Self {
            normalize_crlf: true,
            ignore_extra_whitespace: false,
        }
    }
}

/// Judge configuration, loadable from a JSON file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Wall clock limit per test case, unless the problem sets its own
    pub case_timeout_ms: u64,
    pub compile_timeout_ms: u64,
    /// Limit for each `--version` style check during discovery
    pub probe_timeout_ms: u64,
    pub max_source_bytes: usize,
    /// Captured stdout/stderr beyond this many bytes is dropped
    pub max_output_bytes: usize,
    pub normalization: NormalizationOptions,
    /// JSON-lines activity log; disabled when unset. An empty path selects
    /// `activity.jsonl` under the platform data directory.
    pub activity_log: Option<PathBuf>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            case_timeout_ms: 5_000,
            compile_timeout_ms: 10_000,
            probe_timeout_ms: 5_000,
            max_source_bytes: 256 * 1024,
            max_output_bytes: 1024 * 1024,
            normalization: NormalizationOptions::default(),
            activity_log: None,
        }
    }
}

impl JudgeConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn case_timeout(&self) -> Duration {
        Duration::from_millis(self.case_timeout_ms)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Where activity entries go, if anywhere
    pub fn activity_log_path(&self) -> Option<PathBuf> {
        self.activity_log.as_ref().map(|path| {
            if path.as_os_str().is_empty() {
                Self::default_activity_dir().join("activity.jsonl")
            } else {
                path.clone()
            }
        })
    }

    /// Default place for activity logs when the caller asks for one without a path
    pub fn default_activity_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("hackathon-judge")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"case_timeout_ms": 1500, "normalization": {{"ignore_extra_whitespace": true}}}}"#)
            .unwrap();

        let config = JudgeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.case_timeout(), Duration::from_millis(1500));
        assert_eq!(config.compile_timeout_ms, 10_000);
        assert!(config.normalization.normalize_crlf);
        assert!(config.normalization.ignore_extra_whitespace);
        assert!(config.activity_log.is_none());
    }

    #[test]
    fn empty_activity_path_uses_data_dir() {
        let config = JudgeConfig {
            activity_log: Some(PathBuf::new()),
            ..JudgeConfig::default()
        };
        let path = config.activity_log_path().unwrap();
        assert!(path.ends_with("hackathon-judge/activity.jsonl"));
        assert!(path.starts_with(JudgeConfig::default_activity_dir()));

        let explicit = JudgeConfig {
            activity_log: Some(PathBuf::from("/tmp/judge/log.jsonl")),
            ..JudgeConfig::default()
        };
        assert_eq!(explicit.activity_log_path(), Some(PathBuf::from("/tmp/judge/log.jsonl")));
        assert_eq!(JudgeConfig::default().activity_log_path(), None);
    }

    #[test]
    fn unreadable_config_reports_path() {
        let err = JudgeConfig::from_json_file(Path::new("/nonexistent/judge.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/judge.json"));
    }
}
