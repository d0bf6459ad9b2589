// Plan executor - applies approved operations inside the working directory
//
// Operations run strictly in plan order. A failing operation is reported and
// recorded, then the next one runs; nothing is rolled back.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::cli::Output;
use crate::errors::OperationError;

use super::approval::ApprovalController;
use super::sandbox;
use super::types::{Operation, OperationKind, Plan};

/// One operation that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    /// 1-based position in the plan
    pub index: usize,
    pub kind: OperationKind,
    pub message: String,
}

/// Aggregate outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub applied: usize,
    pub skipped: usize,
    pub failures: Vec<OperationFailure>,
}

impl ExecutionReport {
    pub fn exit_code(&self) -> i32 {
        if self.failures.is_empty() {
            0
        } else {
            1
        }
    }
}

/// What happened to an operation that did not fail.
enum Outcome {
    Applied(String),
    Skipped(String),
}

pub struct PlanExecutor {
    working_dir: PathBuf,
    output: Arc<dyn Output>,
}

impl PlanExecutor {
    pub fn new(working_dir: impl Into<PathBuf>, output: Arc<dyn Output>) -> Self {
        Self {
            working_dir: sandbox::clean(&working_dir.into()),
            output,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Apply every operation in order. `approvals` gates each shell command.
    pub fn apply(&self, plan: &Plan, approvals: &mut ApprovalController) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for (i, op) in plan.operations.iter().enumerate() {
            match self.apply_operation(op, approvals) {
                Ok(Outcome::Applied(message)) => {
                    tracing::info!("Applied {}: {}", op.kind.as_str(), message);
                    self.output.success(&format!("- {}", message));
                    report.applied += 1;
                }
                Ok(Outcome::Skipped(message)) => {
                    tracing::debug!("Skipped {}: {}", op.kind.as_str(), message);
                    self.output.warn(&format!("- {}", message));
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("Operation {} ({}) failed: {}", i + 1, op.kind.as_str(), e);
                    let message = e.to_string();
                    self.output.error(&format!("- {}", message));
                    report.failures.push(OperationFailure {
                        index: i + 1,
                        kind: op.kind.clone(),
                        message,
                    });
                }
            }
        }

        report
    }

    fn apply_operation(
        &self,
        op: &Operation,
        approvals: &mut ApprovalController,
    ) -> Result<Outcome, OperationError> {
        match &op.kind {
            OperationKind::CreateDir => self.create_dir(op.path.trim()),
            OperationKind::CreateFile => self.create_file(op.path.trim(), &op.content),
            OperationKind::UpdateFile => self.update_file(op.path.trim(), &op.content),
            OperationKind::Rename => self.rename(op.rename_source(), op.to.trim()),
            OperationKind::RunCommand => self.run_command(op.command.trim(), approvals),
            OperationKind::Unknown(raw) => {
                Ok(Outcome::Skipped(format!("skipped unknown op type: {}", raw)))
            }
        }
    }

    fn resolve(&self, role: &'static str, raw: &str) -> Result<PathBuf, OperationError> {
        sandbox::resolve(&self.working_dir, raw).map_err(|source| {
            tracing::debug!("Rejected {} path {:?}: {:?}", role, raw, source);
            OperationError::InvalidPath {
                role,
                path: raw.to_string(),
                source,
            }
        })
    }

    fn create_dir(&self, raw: &str) -> Result<Outcome, OperationError> {
        let target = self.resolve("target", raw)?;
        fs::create_dir_all(&target).map_err(|e| OperationError::io("create_dir", raw, e))?;
        Ok(Outcome::Applied(format!("created dir: {}", raw)))
    }

    fn create_file(&self, raw: &str, content: &str) -> Result<Outcome, OperationError> {
        let target = self.resolve("target", raw)?;
        ensure_parent(&target, raw)?;

        // symlink_metadata so a dangling link still counts as existing
        if fs::symlink_metadata(&target).is_ok() {
            return Ok(Outcome::Skipped(format!("skipped existing file: {}", raw)));
        }

        fs::write(&target, content).map_err(|e| OperationError::io("create_file", raw, e))?;
        Ok(Outcome::Applied(format!("created file: {}", raw)))
    }

    fn update_file(&self, raw: &str, content: &str) -> Result<Outcome, OperationError> {
        let target = self.resolve("target", raw)?;
        ensure_parent(&target, raw)?;
        fs::write(&target, content).map_err(|e| OperationError::io("update_file", raw, e))?;
        Ok(Outcome::Applied(format!("updated file: {}", raw)))
    }

    fn rename(&self, from_raw: &str, to_raw: &str) -> Result<Outcome, OperationError> {
        let from = self.resolve("from", from_raw)?;
        let to = self.resolve("to", to_raw)?;

        if fs::symlink_metadata(&from).is_err() {
            return Err(OperationError::SourceMissing(from_raw.to_string()));
        }
        if fs::symlink_metadata(&to).is_ok() {
            return Err(OperationError::TargetExists(to_raw.to_string()));
        }

        ensure_parent(&to, to_raw)?;
        fs::rename(&from, &to).map_err(|e| {
            OperationError::io("rename", format!("{} -> {}", from_raw, to_raw), e)
        })?;
        Ok(Outcome::Applied(format!("renamed: {} -> {}", from_raw, to_raw)))
    }

    fn run_command(
        &self,
        command: &str,
        approvals: &mut ApprovalController,
    ) -> Result<Outcome, OperationError> {
        if command.is_empty() {
            return Ok(Outcome::Skipped("skipped empty command".to_string()));
        }
        if !approvals.confirm(&format!("Run command '{}'", command)) {
            return Ok(Outcome::Skipped(format!("skipped command: {}", command)));
        }

        tracing::info!("Running command in {}: {}", self.working_dir.display(), command);
        let output = shell_command(command)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| OperationError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim();
        if !combined.is_empty() {
            self.output.line(combined);
        }

        if !output.status.success() {
            return Err(OperationError::CommandFailed {
                command: command.to_string(),
                status: output.status.to_string(),
            });
        }
        Ok(Outcome::Applied(format!("command succeeded: {}", command)))
    }
}

fn ensure_parent(target: &Path, raw: &str) -> Result<(), OperationError> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| OperationError::io("prepare dir for", raw, e)),
        None => Ok(()),
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-Command", command]);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-lc", command]);
    cmd
}
