//! Shell command execution for external post-processors

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::core::error::{Error, Result};

/// Runs a shell command line
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `command` in `working_dir`
    async fn execute(&self, command: &str, working_dir: &Path) -> Result<CommandResult>;
}

/// Captured outcome of one command
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes through `sh -c` (`cmd /C` on Windows)
pub struct ShellCommandExecutor;

impl ShellCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn execute(&self, command: &str, working_dir: &Path) -> Result<CommandResult> {
        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let output = Command::new(shell)
            .arg(shell_arg)
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::post_process(
                    working_dir,
                    format!("Failed to execute command '{command}': {e}"),
                )
            })?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Records every command and answers from canned results
#[cfg(test)]
pub struct MockCommandExecutor {
    pub results: std::collections::HashMap<String, CommandResult>,
    pub executed: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self {
            results: std::collections::HashMap::new(),
            executed: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(
        mut self,
        command: &str,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        self.results.insert(
            command.to_string(),
            CommandResult {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    async fn execute(&self, command: &str, working_dir: &Path) -> Result<CommandResult> {
        self.executed.lock().unwrap().push(command.to_string());
        self.results.get(command).cloned().ok_or_else(|| {
            Error::post_process(
                working_dir,
                format!("Mock executor has no result for command: {command}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_command_executor_success() {
        let dir = tempdir().unwrap();
        let result = ShellCommandExecutor::new()
            .execute("echo hello", dir.path())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(result.stdout.contains("hello"));
        assert!(result.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_command_executor_failure() {
        let dir = tempdir().unwrap();
        let result = ShellCommandExecutor::new()
            .execute("echo broken >&2; exit 3", dir.path())
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.exit_code, 3);
        assert!(result.stderr.contains("broken"));
    }

    #[tokio::test]
    async fn test_mock_command_executor_records_commands() {
        let executor = MockCommandExecutor::new().with_result("fmt a.gen.ts", 0, "", "");
        let dir = tempdir().unwrap();

        assert!(executor.execute("fmt a.gen.ts", dir.path()).await.unwrap().is_success());
        assert!(executor.execute("unknown", dir.path()).await.is_err());
        assert_eq!(executor.executed(), vec!["fmt a.gen.ts", "unknown"]);
    }
}
