// Approval controller - plan-level decision and per-command confirmation
//
// Reads are fail-safe: an I/O error or end of input always means "no".

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::Arc;

use crate::cli::Output;

use super::types::ApplyDecision;

/// Source of interactive input lines.
pub trait LineReader: Send {
    /// Read one line without its terminator. `Ok(None)` means end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Reads lines from the process's stdin.
#[derive(Debug, Default)]
pub struct StdinReader;

impl LineReader for StdinReader {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        let read = io::stdin().lock().read_line(&mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Pre-recorded answers, consumed front to back. Runs dry as end of input.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    lines: VecDeque<String>,
}

impl ScriptedReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Asks the user before anything touches the filesystem or shell.
pub struct ApprovalController {
    reader: Box<dyn LineReader>,
    output: Arc<dyn Output>,
}

impl ApprovalController {
    pub fn new(reader: Box<dyn LineReader>, output: Arc<dyn Output>) -> Self {
        Self { reader, output }
    }

    /// Interactive controller on stdin.
    pub fn stdin(output: Arc<dyn Output>) -> Self {
        Self::new(Box::new(StdinReader), output)
    }

    /// Ask whether to apply a plan.
    ///
    /// `y`/`yes` approves; `n`/`no`/empty declines; any other text declines
    /// and is handed back verbatim as the next prompt.
    pub fn request_decision(&mut self, message: &str) -> ApplyDecision {
        self.output
            .prompt(&format!("{}? [y/N or type next prompt]: ", message));

        let Some(input) = self.next_line() else {
            return ApplyDecision::Decline { next_prompt: None };
        };

        let choice = input.trim();
        match choice.to_lowercase().as_str() {
            "y" | "yes" => ApplyDecision::Approve,
            "" | "n" | "no" => ApplyDecision::Decline { next_prompt: None },
            _ => ApplyDecision::Decline {
                next_prompt: Some(choice.to_string()),
            },
        }
    }

    /// Plain yes/no gate, used before every shell command.
    pub fn confirm(&mut self, message: &str) -> bool {
        self.output.prompt(&format!("{}? [y/N]: ", message));

        match self.next_line() {
            Some(input) => matches!(input.trim().to_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }

    fn next_line(&mut self) -> Option<String> {
        match self.reader.read_line() {
            Ok(Some(line)) => Some(line),
            Ok(None) => {
                // Keep the terminal tidy after an inline prompt with no answer
                self.output.line("");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read approval input: {}", e);
                self.output.line("");
                None
            }
        }
    }
}
