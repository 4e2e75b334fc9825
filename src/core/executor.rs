//! Command execution module.
//!
//! Spawns the publish tool and captures its output. The plugin talks to
//! [`CommandExecutor`] so tests can substitute a fake without spawning
//! processes.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,

    /// Whether the command exited successfully
    pub success: bool,

    /// Standard output followed by standard error
    pub output: String,
}

impl CommandOutput {
    /// A successful run with the given output.
    pub fn success(output: impl Into<String>) -> Self {
        Self { code: Some(0), success: true, output: output.into() }
    }

    /// A failed run with the given exit code and output.
    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self { code: Some(code), success: false, output: output.into() }
    }

    /// Describe how the process ended.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, in `dir` when given, and capture output.
    ///
    /// Dropping the returned future must stop the process.
    async fn run(&self, program: &str, args: &[String], dir: Option<&Path>)
        -> io::Result<CommandOutput>;
}

/// Executor that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        dir: Option<&Path>,
    ) -> io::Result<CommandOutput> {
        let start = Instant::now();

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);

        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = cmd.output().await?;
        let duration: Duration = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = if stderr.is_empty() {
            stdout.into_owned()
        } else if stdout.is_empty() {
            stderr.into_owned()
        } else {
            format!("{}\n{}", stdout.trim_end(), stderr)
        };

        tracing::debug!(
            program,
            code = ?output.status.code(),
            elapsed_ms = duration.as_millis() as u64,
            "Command finished"
        );

        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            output: combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(CommandOutput::failure(101, "").status_text(), "exit status 101");
        assert_eq!(CommandOutput::success("ok").status_text(), "exit status 0");
        let killed = CommandOutput { code: None, success: false, output: String::new() };
        assert_eq!(killed.status_text(), "terminated by signal");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_simple_command() {
        let executor = ProcessExecutor::new();
        let result = executor.run("echo", &["hello".to_string()], None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.code, Some(0));
        assert!(result.output.contains("hello"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_with_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let executor = ProcessExecutor::new();
        let result = executor.run("pwd", &[], Some(dir.path())).await.unwrap();
        assert!(result.success);

        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(result.output.contains(&name));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_stderr_and_failure() {
        let executor = ProcessExecutor::new();
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let result = executor.run("sh", &args, None).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.code, Some(3));
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let executor = ProcessExecutor::new();
        let result = executor.run("definitely-not-a-real-binary-7f3a", &[], None).await;
        assert!(result.is_err());
    }
}
