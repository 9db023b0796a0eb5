//! Configuration sink
//!
//! The sink is the collaborator that takes a rendered configuration and makes
//! a live proxy serve it. The core never calls it directly; the reconcile
//! loop pushes to it only when the fingerprint gate reports a change, and
//! only a successful apply advances the gate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use crate::common::{MonitorError, Result};

/// Accepts a serialized configuration blob plus its content fingerprint.
#[async_trait]
pub trait ConfigSink: Send + Sync {
    /// Apply the configuration. An error means nothing was confirmed; the
    /// caller retries on the next cycle.
    async fn apply(&self, text: &str, fingerprint: &str) -> Result<()>;
}

/// Writes the configuration to disk and reloads the proxy process.
///
/// The write goes through a sibling temp file and a rename, so the proxy
/// never reads a half-written configuration. The reload command is run only
/// after a successful rename; a non-zero exit fails the apply.
#[derive(Debug, Clone)]
pub struct FileReloadSink {
    output_path: PathBuf,
    reload_command: Vec<String>,
}

impl FileReloadSink {
    /// `reload_command` is a whitespace-separated command line; empty
    /// disables reloading (write-only mode).
    pub fn new<P: AsRef<Path>>(output_path: P, reload_command: &str) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            reload_command: reload_command.split_whitespace().map(str::to_string).collect(),
        }
    }

    async fn write_config(&self, text: &str) -> Result<()> {
        let staged = self.output_path.with_extension("new");
        tokio::fs::write(&staged, text).await?;
        tokio::fs::rename(&staged, &self.output_path).await?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let Some((program, arguments)) = self.reload_command.split_first() else {
            debug!("no reload command configured, write-only apply");
            return Ok(());
        };

        let output = Command::new(program)
            .args(arguments)
            .output()
            .await
            .map_err(|e| {
                MonitorError::Sink(format!("failed to run {}: {}", program, e))
            })?;

        if !output.status.success() {
            return Err(MonitorError::Sink(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigSink for FileReloadSink {
    async fn apply(&self, text: &str, fingerprint: &str) -> Result<()> {
        info!(
            "writing configuration to {} (fingerprint {})",
            self.output_path.display(),
            fingerprint
        );
        self.write_config(text).await?;
        self.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_only_apply() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("haproxy.cfg");

        let sink = FileReloadSink::new(&output, "");
        sink.apply("test-header\n", "fp-1").await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "test-header\n");
        // The staging file must not linger after the rename.
        assert!(!dir.path().join("haproxy.new").exists());
    }

    #[tokio::test]
    async fn test_apply_overwrites_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("haproxy.cfg");

        let sink = FileReloadSink::new(&output, "");
        sink.apply("first\n", "fp-1").await.unwrap();
        sink.apply("second\n", "fp-2").await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "second\n");
    }

    #[tokio::test]
    async fn test_successful_reload_command() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("haproxy.cfg");

        let sink = FileReloadSink::new(&output, "true");
        sink.apply("test-header\n", "fp-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_reload_command_fails_the_apply() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("haproxy.cfg");

        let sink = FileReloadSink::new(&output, "false");
        let err = sink.apply("test-header\n", "fp-1").await.unwrap_err();
        assert!(matches!(err, MonitorError::Sink(_)));

        // The write itself happened; only the reload failed.
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_missing_reload_program_fails_the_apply() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("haproxy.cfg");

        let sink = FileReloadSink::new(&output, "no-such-reload-binary-xyz");
        assert!(matches!(
            sink.apply("test-header\n", "fp-1").await,
            Err(MonitorError::Sink(_))
        ));
    }
}
