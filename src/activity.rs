use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What happened, as recorded in the activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Submitted,
    Completed,
    Rejected,
}

/// One line of the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub team: String,
    pub activity: Activity,
    pub round: Option<String>,
    pub question_id: String,
    pub status: String,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub details: Option<String>,
}

impl ActivityEntry {
    pub fn new(team: &str, activity: Activity, question_id: &str, status: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            team: team.to_string(),
            activity,
            round: None,
            question_id: question_id.to_string(),
            status: status.into(),
            score: None,
            max_score: None,
            details: None,
        }
    }

    pub fn round(mut self, round: Option<&str>) -> Self {
        self.round = round.map(str::to_string);
        self
    }

    pub fn score(mut self, score: f64, max_score: f64) -> Self {
        self.score = Some(score);
        self.max_score = Some(max_score);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Append-only JSON-lines log of final submissions
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &ActivityEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(entry).context("Failed to encode activity entry")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open activity log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .context("Failed to write activity entry")?;
        file.flush().await.context("Failed to flush activity log")?;
        Ok(())
    }

    /// Every entry in the log, oldest first. A missing file is an empty log.
    pub async fn read_all(&self) -> Result<Vec<ActivityEntry>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read activity log {}", self.path.display()))
            }
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("Malformed activity entry"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("logs").join("activity.jsonl"));

        log.append(&ActivityEntry::new("team-7", Activity::Submitted, "palindrome", "pending").round(Some("dsa1")))
            .await
            .unwrap();
        log.append(
            &ActivityEntry::new("team-7", Activity::Completed, "palindrome", "ok")
                .round(Some("dsa1"))
                .score(10.0, 10.0),
        )
        .await
        .unwrap();

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].activity, Activity::Submitted);
        assert_eq!(entries[1].score, Some(10.0));
        assert_eq!(entries[1].round.as_deref(), Some("dsa1"));
        assert_eq!(entries[1].timestamp.len(), "2024-01-01 00:00:00".len());
    }

    #[tokio::test]
    async fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("none.jsonl"));
        assert!(log.read_all().await.unwrap().is_empty());
    }
}
