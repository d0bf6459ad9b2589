// Command-line arguments

use clap::{Parser, Subcommand};

const AFTER_HELP: &str = "\
Behavior:
  - Prompts automatically include the current workspace structure
  - Every file, folder, or command action requires approval before it runs

Examples:
  aifiler create \"create src and README\"
  aifiler rename \"rename docs to documentation folder\"
  aifiler \"summarize how to organize this repo\"

Vercel quick setup:
  aifiler set vercel <ai-gateway-api-key>
  aifiler default openai/gpt-4o-mini
  aifiler list";

/// aifiler - AI-powered, local-first file and folder assistant
#[derive(Debug, Parser)]
#[command(name = "aifiler", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Provider for this run (overrides the configured default)
    #[arg(long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model for this run (overrides the configured default)
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Free-form request; answered in text or as a plan to approve
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or update files and folders from AI suggestions
    Create {
        #[arg(required = true, value_name = "PROMPT")]
        prompt: Vec<String>,
    },

    /// Rename files and folders from AI suggestions
    Rename {
        #[arg(required = true, value_name = "PROMPT")]
        prompt: Vec<String>,
    },

    /// List providers, models, and API key status
    List,

    /// Save an API key for a provider
    Set { provider: String, api_key: String },

    /// Set the default model
    Default {
        #[arg(required = true, value_name = "MODEL")]
        model: Vec<String>,
    },

    /// Remove a provider's API key ("*" matches any stored key)
    Reset { provider: String, api_key: String },

    /// Show runtime diagnostics
    Doctor,
}

/// Join prompt words the way they were typed.
pub fn join_words(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}
