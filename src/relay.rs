use crate::types::{JudgingResult, OverallStatus};
use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, ToSocketAddrs};

/// Score report for one final submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub team_name: String,
    pub timestamp: String,
    pub round: Option<String>,
    pub problem_id: String,
    pub score: f64,
    pub total_points: f64,
    pub status: OverallStatus,
}

impl ScoreRecord {
    pub fn new(team_name: &str, round: Option<&str>, problem_id: &str, result: &JudgingResult) -> Self {
        Self {
            team_name: team_name.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            round: round.map(str::to_string),
            problem_id: problem_id.to_string(),
            score: result.total_score,
            total_points: result.total_points,
            status: OverallStatus::from_result(result),
        }
    }
}

/// Sends score records to a scoreboard as newline-delimited JSON
pub struct ScoreRelay {
    stream: TcpStream,
}

impl ScoreRelay {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .context("Failed to connect to score relay")?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, record: &ScoreRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record).context("Failed to encode score record")?;
        line.push(b'\n');
        self.stream
            .write_all(&line)
            .await
            .context("Failed to send score record")?;
        self.stream.flush().await?;
        tracing::info!(team = %record.team_name, score = record.score, "score relayed");
        Ok(())
    }
}
