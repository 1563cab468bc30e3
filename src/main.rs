use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hackathon_judge::judge::{parse_request, rejected_response};
use hackathon_judge::logging;
use hackathon_judge::relay::{ScoreRecord, ScoreRelay};
use hackathon_judge::{Judge, JudgeConfig, JudgeResponse};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;

#[derive(Debug, Parser)]
#[command(name = "hackathon-judge", version, about = "Compile, run and score hackathon submissions")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "HACKJUDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level or filter directive (overrides --verbose)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Record final submissions; without a path the log goes to the user data directory
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    activity_log: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Judge one request and print the response as JSON
    Judge {
        /// Request file, or `-` for stdin
        #[arg(long, default_value = "-")]
        request: String,

        /// Send the score of a team's final submission to this scoreboard
        #[arg(long, value_name = "HOST:PORT")]
        relay: Option<String>,
    },
    /// Print the toolchains found on this machine
    Toolchains,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => JudgeConfig::from_json_file(path)?,
        None => JudgeConfig::default(),
    };
    if let Some(path) = &cli.activity_log {
        config.activity_log = Some(path.clone().unwrap_or_default());
    }

    match cli.command {
        Command::Toolchains => {
            let judge = Judge::new(config).await;
            println!("{}", serde_json::to_string_pretty(judge.toolchains())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Judge { request, relay } => {
            let text = read_request(&request).await?;
            let (response, record) = match parse_request(&text) {
                Ok(request) => {
                    let team = request.team.clone().filter(|_| request.mode.is_final());
                    let round = request.round.clone();
                    let problem_id = request.problem.id.clone();
                    let judge = Judge::new(config).await;
                    let response = judge.judge(request).await;
                    let record = match (team, &response.result) {
                        (Some(team), Some(result)) => {
                            Some(ScoreRecord::new(&team, round.as_deref(), &problem_id, result))
                        }
                        _ => None,
                    };
                    (response, record)
                }
                Err(e) => {
                    tracing::info!(error = %e, "request rejected");
                    (rejected_response(&e), None)
                }
            };

            if let (Some(addr), Some(record)) = (relay, record) {
                if let Err(e) = send_score(&addr, &record).await {
                    tracing::warn!(error = %format!("{:#}", e), relay = %addr, "score not relayed");
                }
            }
            print_response(&response)?;
            Ok(if response.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

async fn read_request(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read request from stdin")?;
        Ok(text)
    } else {
        let path = Path::new(source);
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request file {}", path.display()))
    }
}

async fn send_score(addr: &str, record: &ScoreRecord) -> Result<()> {
    let mut relay = ScoreRelay::connect(addr).await?;
    relay.send(record).await
}

fn print_response(response: &JudgeResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
