use crate::constants::exec::{TIMEOUT_EXIT_STATUS, TIMEOUT_STDERR};
use crate::errors::ToolError;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Captured output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_status: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
        }
    }

    /// The result reported when the transport gives up waiting on a command.
    pub fn timed_out() -> Self {
        Self::new("", TIMEOUT_STDERR, TIMEOUT_EXIT_STATUS)
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    pub fn is_timeout(&self) -> bool {
        self.exit_status == TIMEOUT_EXIT_STATUS && self.stderr == TIMEOUT_STDERR
    }
}

/// One exclusively owned remote session: command execution plus file download.
///
/// Only transport failures are errors. A command that exits non-zero, or that
/// runs past its timeout, is reported through [`CommandResult`].
pub trait RemoteShell {
    fn run(&mut self, command: &str, timeout: Duration) -> Result<CommandResult, ToolError>;

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, ToolError>;

    /// Releases the session. Calling it again is a no-op.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::CommandResult;

    #[test]
    fn timeout_sentinel_shape() {
        let result = CommandResult::timed_out();
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "Command timed out");
        assert_eq!(result.exit_status, 124);
        assert!(result.is_timeout());
        assert!(!result.success());
    }

    #[test]
    fn exit_124_from_remote_is_not_a_transport_timeout() {
        let result = CommandResult::new("", "timeout: sending signal TERM", 124);
        assert!(!result.is_timeout());
    }
}
