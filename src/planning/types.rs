// Plan types - Operation, Plan, ApplyDecision, ApplyResult
//
// The wire shape is loose (every field optional, free-form `type` string).
// Kinds are normalized once at the deserialization boundary so the renderer
// and executor only ever match on `OperationKind`.

use serde::Deserialize;

/// What a single operation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    CreateDir,
    CreateFile,
    UpdateFile,
    Rename,
    RunCommand,
    /// Anything the model invented. Skipped with a warning.
    Unknown(String),
}

impl OperationKind {
    /// Normalize a raw `type` value, accepting the common aliases.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "create_dir" | "mkdir" => Self::CreateDir,
            "create_file" | "touch" => Self::CreateFile,
            "update_file" | "write_file" => Self::UpdateFile,
            "rename" | "move" => Self::Rename,
            "run_command" => Self::RunCommand,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Canonical wire name; unknown kinds echo the raw type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateDir => "create_dir",
            Self::CreateFile => "create_file",
            Self::UpdateFile => "update_file",
            Self::Rename => "rename",
            Self::RunCommand => "run_command",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Raw JSON shape from the model; allows missing and null fields
#[derive(Debug, Default, Deserialize)]
struct RawOperation {
    #[serde(default, rename = "type")]
    op_type: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    command: Option<String>,
}

/// One planned filesystem/process action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOperation")]
pub struct Operation {
    pub kind: OperationKind,
    /// The `type` string exactly as the model wrote it.
    pub raw_type: String,
    pub path: String,
    pub from: String,
    pub to: String,
    pub content: String,
    pub command: String,
}

impl From<RawOperation> for Operation {
    fn from(raw: RawOperation) -> Self {
        let raw_type = raw.op_type.unwrap_or_default();
        Self {
            kind: OperationKind::parse(&raw_type),
            raw_type,
            path: raw.path.unwrap_or_default(),
            from: raw.from.unwrap_or_default(),
            to: raw.to.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            command: raw.command.unwrap_or_default(),
        }
    }
}

impl Operation {
    fn blank(kind: OperationKind) -> Self {
        Self {
            raw_type: kind.as_str().to_string(),
            kind,
            path: String::new(),
            from: String::new(),
            to: String::new(),
            content: String::new(),
            command: String::new(),
        }
    }

    pub fn create_dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::blank(OperationKind::CreateDir)
        }
    }

    pub fn create_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ..Self::blank(OperationKind::CreateFile)
        }
    }

    pub fn update_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ..Self::blank(OperationKind::UpdateFile)
        }
    }

    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Self::blank(OperationKind::Rename)
        }
    }

    pub fn run_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::blank(OperationKind::RunCommand)
        }
    }

    /// Rename source: `from`, falling back to `path` when empty.
    pub fn rename_source(&self) -> &str {
        let from = self.from.trim();
        if from.is_empty() {
            self.path.trim()
        } else {
            from
        }
    }
}

/// Ordered operations proposed for one conversation turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Plan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

/// Outcome of the plan-level approval prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyDecision {
    /// Execute the plan as proposed
    Approve,
    /// Reject; `next_prompt` replaces the next turn's input when present
    Decline { next_prompt: Option<String> },
}

impl ApplyDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve)
    }
}

/// Result of one preview → approve → execute pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub exit_code: i32,
    pub next_prompt: Option<String>,
}

impl ApplyResult {
    pub fn done(exit_code: i32) -> Self {
        Self {
            exit_code,
            next_prompt: None,
        }
    }

    pub fn follow_up(prompt: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            next_prompt: Some(prompt.into()),
        }
    }
}
