// Prompt templates for each conversation mode

/// JSON shape every mode asks for
const PLAN_FORMAT: &str = r#"{"operations":[{"type":"create_dir|create_file|update_file|rename|run_command","path":"relative/path","from":"relative/path","to":"relative/path","content":"optional","command":"optional"}]}"#;

const RENAME_FORMAT: &str =
    r#"{"operations":[{"type":"rename|run_command","from":"relative/path","to":"relative/path","command":"optional"}]}"#;

/// Which template a conversation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Create or update files and folders
    Create,
    /// Rename/move only
    Rename,
    /// Free-form: either a plan or a plain text answer
    Dynamic,
}

impl PromptMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptMode::Create => "create",
            PromptMode::Rename => "rename",
            PromptMode::Dynamic => "dynamic",
        }
    }

    pub fn build(self, user_prompt: &str, workspace_context: &str) -> String {
        match self {
            PromptMode::Create => build_create_prompt(user_prompt, workspace_context),
            PromptMode::Rename => build_rename_prompt(user_prompt, workspace_context),
            PromptMode::Dynamic => build_dynamic_prompt(user_prompt, workspace_context),
        }
    }
}

pub fn build_create_prompt(user_prompt: &str, workspace_context: &str) -> String {
    format!(
        "You turn requests into filesystem operations.
Respond with STRICT JSON only, shaped exactly like this:
{PLAN_FORMAT}
Rules:
- work out file and folder targets from the workspace context; never ask the user to describe the layout
- every path is relative and stays inside the current directory
- use update_file to change a file that already exists
- use run_command only when it is required, and only for non-interactive commands
- no explanations
- no markdown fences
Workspace context:
{workspace_context}
User request: {user_prompt}"
    )
}

pub fn build_rename_prompt(user_prompt: &str, workspace_context: &str) -> String {
    format!(
        "You turn requests into filesystem rename operations.
Respond with STRICT JSON only, shaped exactly like this:
{RENAME_FORMAT}
Rules:
- work out file and folder targets from the workspace context; never ask the user to describe the layout
- every path is relative and stays inside the current directory
- use run_command only for non-interactive commands
- no explanations
- no markdown fences
Workspace context:
{workspace_context}
User request: {user_prompt}"
    )
}

pub fn build_dynamic_prompt(user_prompt: &str, workspace_context: &str) -> String {
    format!(
        "You are working inside a local workspace.
When the request needs filesystem changes or commands, respond with STRICT JSON only, shaped exactly like this:
{PLAN_FORMAT}
When the request is purely informational, answer in plain text instead.
Rules for plans:
- work out file and folder targets from the workspace context; never ask the user to describe the layout
- every path is relative and stays inside the current directory
- use update_file to change a file that already exists
- use run_command only when it is required, and only for non-interactive commands
- no markdown fences around JSON
Workspace context:
{workspace_context}
User request: {user_prompt}"
    )
}

/// Second-chance request after a response failed to parse.
pub fn build_plan_coercion_prompt(user_prompt: &str, model_response: &str) -> String {
    format!(
        "Rewrite the response below as STRICT JSON only, shaped exactly like this:
{PLAN_FORMAT}
Rules:
- no explanations
- no markdown fences
- every path is relative
- if no filesystem change is needed, return {{\"operations\":[]}}
User request: {user_prompt}
Response to rewrite:
{model_response}"
    )
}
