//! Interactive sessions for a selected candidate.
//!
//! A model gets a line-based chat loop against a [`ChatProvider`]; a CLI tool is handed to a
//! [`ProcessLauncher`] and owns the terminal until it exits.

use std::io::{self, BufRead, Write};

use crate::candidate::{Candidate, CandidateKind};
use crate::exec::{LaunchError, LaunchOutcome, ProcessLauncher};
use crate::llm::ChatProvider;

/// Typing one of these (any case) ends a chat session.
pub const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "q"];

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Exit keyword, tool exit, or an error that was already reported.
    Finished,
    /// Input closed (Ctrl-D); callers end quietly.
    Interrupted,
}

fn is_exit_keyword(line: &str) -> bool {
    EXIT_KEYWORDS.iter().any(|k| line.eq_ignore_ascii_case(k))
}

/// Chat with `candidate` one line at a time until an exit keyword, end of input, or the
/// first provider error (printed, then the session ends).
pub async fn run_chat<P, R, W>(
    provider: &P,
    candidate: &Candidate,
    input: &mut R,
    out: &mut W,
) -> io::Result<SessionOutcome>
where
    P: ChatProvider + ?Sized,
    R: BufRead,
    W: Write,
{
    let name = candidate.name();
    writeln!(
        out,
        "Chatting with {}. Type {} to leave.",
        name,
        EXIT_KEYWORDS.join("/")
    )?;
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(SessionOutcome::Interrupted);
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if is_exit_keyword(text) {
            return Ok(SessionOutcome::Finished);
        }
        match provider.chat(candidate.target(), text).await {
            Ok(reply) => writeln!(out, "{}: {}\n", name, reply.trim_end())?,
            Err(e) => {
                log::warn!("chat with {} failed: {}", name, e);
                writeln!(out, "{}: Error: {}", name, e)?;
                return Ok(SessionOutcome::Finished);
            }
        }
    }
}

/// Run a CLI tool in the foreground and report how it ended. Ctrl-C inside the tool is a
/// normal way to leave it.
pub async fn run_tool<L, W>(launcher: &L, tool: &str, out: &mut W) -> io::Result<SessionOutcome>
where
    L: ProcessLauncher + ?Sized,
    W: Write,
{
    match launcher.launch(tool).await {
        Ok(LaunchOutcome::Success) | Ok(LaunchOutcome::Interrupted) => {}
        Ok(LaunchOutcome::Failed(code)) => {
            let code = code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string());
            writeln!(out, "'{}' exited with status {}", tool, code)?;
        }
        Err(LaunchError::NotFound(_)) => {
            writeln!(out, "'{}' was not found on PATH.", tool)?;
            writeln!(
                out,
                "If it is installed somewhere else, register it with: ai-cli config add-tool <name-or-path>"
            )?;
        }
        Err(e) => writeln!(out, "Error: {}", e)?,
    }
    Ok(SessionOutcome::Finished)
}

/// Start the session that fits the candidate's kind.
pub async fn dispatch<P, L, R, W>(
    provider: &P,
    launcher: &L,
    candidate: &Candidate,
    input: &mut R,
    out: &mut W,
) -> io::Result<SessionOutcome>
where
    P: ChatProvider + ?Sized,
    L: ProcessLauncher + ?Sized,
    R: BufRead,
    W: Write,
{
    match candidate.kind() {
        CandidateKind::Model => run_chat(provider, candidate, input, out).await,
        CandidateKind::CliTool => run_tool(launcher, &candidate.name(), out).await,
    }
}
