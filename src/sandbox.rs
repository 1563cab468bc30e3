use anyhow::{Context, Result};
use std::path::Path;
use tempfile::TempDir;

/// Scratch directory owned by one judging session.
///
/// Sources, build outputs and compiled artifacts live here. The directory is
/// removed when the value is dropped, including on early returns, timeouts
/// and panics.
#[derive(Debug)]
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("hackathon-judge-")
            .tempdir()
            .context("Failed to create sandbox directory")?;
        Ok(Self { dir })
    }

    /// Get the working directory path
    pub fn working_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now and report any failure
    pub fn cleanup(self) -> Result<()> {
        self.dir
            .close()
            .context("Failed to cleanup sandbox directory")
    }
}
