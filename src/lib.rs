pub mod activity;
pub mod adapter;
pub mod compiler;
pub mod config;
pub mod error;
pub mod executor;
pub mod judge;
pub mod logging;
pub mod normalize;
pub mod relay;
pub mod runner;
pub mod sandbox;
pub mod session;
pub mod stubs;
pub mod toolchain;
pub mod transcript;
pub mod types;

pub use config::{JudgeConfig, NormalizationOptions};
pub use error::JudgeError;
pub use judge::{Judge, SessionOutcome};
pub use runner::CancelFlag;
pub use session::{JudgingSession, SessionState};
pub use toolchain::ToolchainRegistry;
pub use transcript::Transcript;
pub use types::*;
