// Output port - every user-facing line goes through here
//
// The renderer, approval prompts, and executor never print directly. They
// receive an `Arc<dyn Output>`: `TerminalOutput` styles and prints to stdout,
// `BufferedOutput` captures plain text so tests can assert on it.

use crossterm::style::Stylize;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, RwLock};

/// Visual role of a text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Header,
    Success,
    Warn,
    Error,
    Muted,
    Info,
    Thinking,
    Path,
    Command,
    OpCreate,
    OpUpdate,
    OpRename,
    OpCommand,
    TreeBranch,
}

/// Types of lines that can be emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Plain,
    Header,
    Success,
    Warn,
    Error,
    Info,
    Muted,
    /// Inline question awaiting a line of input (no trailing newline)
    Prompt,
}

impl MessageKind {
    fn style(self) -> Option<Style> {
        match self {
            MessageKind::Plain | MessageKind::Prompt => None,
            MessageKind::Header => Some(Style::Header),
            MessageKind::Success => Some(Style::Success),
            MessageKind::Warn => Some(Style::Warn),
            MessageKind::Error => Some(Style::Error),
            MessageKind::Info => Some(Style::Info),
            MessageKind::Muted => Some(Style::Muted),
        }
    }
}

/// Presentation port.
pub trait Output: Send + Sync {
    /// Apply a style to a fragment so it can be composed into a larger line.
    fn paint(&self, style: Style, text: &str) -> String;

    /// Emit one complete line (or an inline prompt for `MessageKind::Prompt`).
    fn emit(&self, kind: MessageKind, text: &str);

    fn line(&self, text: &str) {
        self.emit(MessageKind::Plain, text);
    }

    fn header(&self, text: &str) {
        self.emit(MessageKind::Header, text);
    }

    fn success(&self, text: &str) {
        self.emit(MessageKind::Success, text);
    }

    fn warn(&self, text: &str) {
        self.emit(MessageKind::Warn, text);
    }

    fn error(&self, text: &str) {
        self.emit(MessageKind::Error, text);
    }

    fn info(&self, text: &str) {
        self.emit(MessageKind::Info, text);
    }

    fn muted(&self, text: &str) {
        self.emit(MessageKind::Muted, text);
    }

    fn prompt(&self, text: &str) {
        self.emit(MessageKind::Prompt, text);
    }
}

/// Styled stdout output.
pub struct TerminalOutput {
    color: bool,
}

impl TerminalOutput {
    /// Colors are enabled when stdout is a terminal and `NO_COLOR` is unset.
    pub fn new() -> Self {
        let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { color }
    }

    pub fn with_color(color: bool) -> Self {
        Self { color }
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for TerminalOutput {
    fn paint(&self, style: Style, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let text = text.to_string();
        let styled = match style {
            Style::Header => text.cyan().bold(),
            Style::Success => text.green().bold(),
            Style::Warn => text.yellow(),
            Style::Error => text.red().bold(),
            Style::Muted => text.dark_grey(),
            Style::Info => text.blue(),
            Style::Thinking => text.magenta().bold(),
            Style::Path => text.white(),
            Style::Command => text.cyan(),
            Style::OpCreate => text.green(),
            Style::OpUpdate => text.yellow(),
            Style::OpRename => text.blue(),
            Style::OpCommand => text.magenta(),
            Style::TreeBranch => text.dark_grey(),
        };
        styled.to_string()
    }

    fn emit(&self, kind: MessageKind, text: &str) {
        let rendered = match kind.style() {
            Some(style) => self.paint(style, text),
            None => text.to_string(),
        };
        let mut stdout = io::stdout().lock();
        let result = if kind == MessageKind::Prompt {
            write!(stdout, "{}", rendered).and_then(|_| stdout.flush())
        } else {
            writeln!(stdout, "{}", rendered)
        };
        if let Err(e) = result {
            tracing::debug!("stdout write failed: {}", e);
        }
    }
}

/// One captured line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMessage {
    pub kind: MessageKind,
    pub content: String,
}

/// Plain-text capture of everything emitted. Clones share one buffer.
#[derive(Clone, Default)]
pub struct BufferedOutput {
    buffer: Arc<RwLock<Vec<OutputMessage>>>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages
    pub fn messages(&self) -> Vec<OutputMessage> {
        self.buffer
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Content of every message, in order
    pub fn lines(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.content).collect()
    }

    /// Content of messages of one kind
    pub fn lines_of(&self, kind: MessageKind) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.content)
            .collect()
    }

    /// Everything joined with newlines
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.content.contains(needle))
    }
}

impl Output for BufferedOutput {
    fn paint(&self, _style: Style, text: &str) -> String {
        text.to_string()
    }

    fn emit(&self, kind: MessageKind, text: &str) {
        self.buffer
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(OutputMessage {
                kind,
                content: text.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_output_records_kinds_in_order() {
        let out = BufferedOutput::new();
        out.header("Proposed operations");
        out.warn("careful");
        out.line("plain");

        let messages = out.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].kind, MessageKind::Header);
        assert_eq!(messages[1].kind, MessageKind::Warn);
        assert_eq!(messages[2].content, "plain");
        assert_eq!(out.lines_of(MessageKind::Warn), vec!["careful".to_string()]);
    }

    #[test]
    fn test_buffered_output_clones_share_buffer() {
        let out = BufferedOutput::new();
        let clone = out.clone();
        clone.success("done");
        assert!(out.contains("done"));
    }

    #[test]
    fn test_buffered_paint_is_plain() {
        let out = BufferedOutput::new();
        assert_eq!(out.paint(Style::Error, "x"), "x");
    }

    #[test]
    fn test_terminal_paint_without_color_is_plain() {
        let out = TerminalOutput::with_color(false);
        assert_eq!(out.paint(Style::Header, "title"), "title");
    }

    #[test]
    fn test_terminal_paint_with_color_adds_escape_codes() {
        let out = TerminalOutput::with_color(true);
        let painted = out.paint(Style::Success, "ok");
        assert!(painted.contains("ok"));
        assert!(painted.contains('\u{1b}'));
    }
}
