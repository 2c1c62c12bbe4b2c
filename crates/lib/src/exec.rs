//! Process launching for CLI tools: hand the terminal to the tool and wait for it.
//! No shell is used; the tool name is executed directly.

use std::io;
use std::process::ExitStatus;

use async_trait::async_trait;
use tokio::process::Command;

/// Exit code shells report for a process ended by SIGINT.
const SIGINT_EXIT_CODE: i32 = 130;

/// How a launched tool finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Success,
    /// Non-zero exit; `None` when the platform gave no code.
    Failed(Option<i32>),
    /// The user pressed Ctrl-C (or the tool died from a signal).
    Interrupted,
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("'{0}' was not found on PATH")]
    NotFound(String),
    #[error("failed to run '{tool}': {source}")]
    Io {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// Runs an already-identified tool with the user's terminal attached.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, tool: &str) -> Result<LaunchOutcome, LaunchError>;
}

/// Launches tools as child processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

fn outcome_from_status(status: ExitStatus) -> LaunchOutcome {
    if status.success() {
        return LaunchOutcome::Success;
    }
    match status.code() {
        Some(SIGINT_EXIT_CODE) => LaunchOutcome::Interrupted,
        Some(code) => LaunchOutcome::Failed(Some(code)),
        // Unix: terminated by a signal.
        None if cfg!(unix) => LaunchOutcome::Interrupted,
        None => LaunchOutcome::Failed(None),
    }
}

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn launch(&self, tool: &str) -> Result<LaunchOutcome, LaunchError> {
        let mut child = Command::new(tool).spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LaunchError::NotFound(tool.to_string())
            } else {
                LaunchError::Io {
                    tool: tool.to_string(),
                    source: e,
                }
            }
        })?;
        log::info!("launched {} (pid {:?})", tool, child.id());

        // Ctrl-C reaches the child through the shared process group; catching it here keeps
        // this process alive until the child has exited.
        let mut interrupted = false;
        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                _ = tokio::signal::ctrl_c() => {
                    log::debug!("ctrl-c while {} was running, waiting for it to exit", tool);
                    interrupted = true;
                }
            }
        };
        let status = status.map_err(|e| LaunchError::Io {
            tool: tool.to_string(),
            source: e,
        })?;
        if interrupted {
            return Ok(LaunchOutcome::Interrupted);
        }
        Ok(outcome_from_status(status))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn exit_codes_map_to_outcomes() {
        assert_eq!(outcome_from_status(ExitStatus::from_raw(0)), LaunchOutcome::Success);
        // Raw wait status: exit code lives in the high byte.
        assert_eq!(
            outcome_from_status(ExitStatus::from_raw(2 << 8)),
            LaunchOutcome::Failed(Some(2))
        );
        assert_eq!(
            outcome_from_status(ExitStatus::from_raw(130 << 8)),
            LaunchOutcome::Interrupted
        );
        // Killed by SIGINT (signal 2), no exit code.
        assert_eq!(outcome_from_status(ExitStatus::from_raw(2)), LaunchOutcome::Interrupted);
    }

    #[tokio::test]
    async fn missing_tool_is_not_found() {
        let err = SystemLauncher
            .launch("ai-cli-definitely-missing-tool")
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::NotFound(ref t) if t == "ai-cli-definitely-missing-tool"));
    }

    #[tokio::test]
    async fn exit_status_of_real_processes() {
        assert_eq!(SystemLauncher.launch("true").await.unwrap(), LaunchOutcome::Success);
        assert_eq!(SystemLauncher.launch("false").await.unwrap(), LaunchOutcome::Failed(Some(1)));
    }
}
