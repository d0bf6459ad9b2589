// CLI module
// Public interface for command-line interface

mod args;
mod commands;
mod output;
mod spinner;

pub use args::{join_words, Cli, Command};
pub use commands::App;
pub use output::{BufferedOutput, MessageKind, Output, OutputMessage, Style, TerminalOutput};
pub use spinner::ThinkingIndicator;
