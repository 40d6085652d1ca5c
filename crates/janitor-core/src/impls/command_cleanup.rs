//! CommandCleanup - 外部 janitor プログラムの実行
//!
//! Runs `<program> [args...] --project=<name> --hour=<hour>` and maps the exit
//! status to success/failure.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::ResourceName;
use crate::error::CleanupError;
use crate::ports::CleanupExecutor;

/// Lines of stderr kept in a failure report.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct CommandCleanup {
    program: PathBuf,
    args: Vec<String>,
    hour: u32,
}

impl CommandCleanup {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            hour: 0,
        }
    }

    /// Arguments placed before the per-resource flags, e.g. the script path
    /// when `program` is an interpreter.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Age threshold passed as `--hour`; 0 cleans everything.
    pub fn with_hour(mut self, hour: u32) -> Self {
        self.hour = hour;
        self
    }

    fn argv(&self, name: &ResourceName) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.push(format!("--project={name}"));
        argv.push(format!("--hour={}", self.hour));
        argv
    }
}

#[async_trait]
impl CleanupExecutor for CommandCleanup {
    async fn clean(&self, name: &ResourceName) -> Result<(), CleanupError> {
        let argv = self.argv(name);
        debug!(program = %self.program.display(), ?argv, "running cleanup");

        // kill_on_drop: the worker drops this future on timeout
        let output = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CleanupError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        Err(CleanupError::ExitStatus {
            code: output.status.code(),
            stderr: tail,
        })
    }
}
