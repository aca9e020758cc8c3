//! Transform stage runner.
//!
//! Runs the configured transformation command (e.g. `dbt build`) as a
//! subprocess once the gate has passed. Scheduling and retries stay with
//! the calling orchestrator; this runner makes a single bounded attempt.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

use crate::gate::manifest::TransformSpec;

/// Output of a completed transform run
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub stdout: String,
    pub duration_ms: u64,
}

/// Subprocess runner for the transformation toolchain
pub struct TransformRunner {
    command: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl TransformRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            workdir: None,
        }
    }

    pub fn from_spec(spec: &TransformSpec) -> Self {
        Self {
            command: spec.command.clone(),
            args: spec.args.clone(),
            workdir: spec.workdir.as_ref().map(PathBuf::from),
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Run the transform command, bounded by `run_timeout`
    pub async fn run(&self, run_timeout: Duration) -> Result<TransformOutput> {
        let started = Instant::now();
        info!(command = %self.command, args = ?self.args, "Starting transform run");

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(workdir) = &self.workdir {
            cmd.current_dir(workdir);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn transform command '{}'", self.command))?;

        let output = timeout(run_timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Transform command '{}' timed out after {:?}",
                    self.command, run_timeout
                )
            })?
            .with_context(|| format!("Failed to wait for transform command '{}'", self.command))?;

        let duration_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Transform command '{}' failed with exit code {}: {}",
                self.command,
                exit_code,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(duration_ms, "Transform run completed");

        Ok(TransformOutput {
            stdout,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let runner = TransformRunner::new("echo", vec!["models built".to_string()]);
        let output = runner.run(Duration::from_secs(5)).await.unwrap();
        assert_eq!(output.stdout.trim(), "models built");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let runner = TransformRunner::new("false", vec![]);
        let err = runner.run(Duration::from_secs(5)).await.unwrap_err();
        assert!(err.to_string().contains("exit code"));
    }

    #[tokio::test]
    async fn test_missing_command_is_error() {
        let runner = TransformRunner::new("readygate-no-such-binary", vec![]);
        assert!(runner.run(Duration::from_secs(5)).await.is_err());
    }

    #[tokio::test]
    async fn test_timeout_enforced() {
        let runner = TransformRunner::new("sleep", vec!["5".to_string()]);
        let err = runner.run(Duration::from_millis(100)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
