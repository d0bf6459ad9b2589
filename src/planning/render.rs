// Plan preview - numbered operation list and annotated proposal tree
//
// Rendering never touches the filesystem; it only reads the plan.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::cli::{Output, Style};

use super::sandbox;
use super::types::{Operation, OperationKind, Plan};

/// One line of the flat summary, e.g. `3. rename docs -> documentation`.
pub fn render_operation_line(index: usize, op: &Operation, out: &dyn Output) -> String {
    let prefix = out.paint(Style::Muted, &format!("{}.", index));

    match &op.kind {
        OperationKind::CreateDir | OperationKind::CreateFile => format!(
            "{} {} {}",
            prefix,
            out.paint(Style::OpCreate, op.kind.as_str()),
            out.paint(Style::Path, op.path.trim())
        ),
        OperationKind::UpdateFile => format!(
            "{} {} {}",
            prefix,
            out.paint(Style::OpUpdate, op.kind.as_str()),
            out.paint(Style::Path, op.path.trim())
        ),
        OperationKind::Rename => format!(
            "{} {} {} {} {}",
            prefix,
            out.paint(Style::OpRename, op.kind.as_str()),
            out.paint(Style::Path, op.rename_source()),
            out.paint(Style::Muted, "->"),
            out.paint(Style::Path, op.to.trim())
        ),
        OperationKind::RunCommand => format!(
            "{} {} {}",
            prefix,
            out.paint(Style::OpCommand, op.kind.as_str()),
            out.paint(Style::Command, op.command.trim())
        ),
        OperationKind::Unknown(raw) => format!("{} {}", prefix, out.paint(Style::Warn, raw)),
    }
}

/// Emit the numbered summary, one line per operation.
pub fn render_summary(plan: &Plan, out: &dyn Output) {
    for (i, op) in plan.operations.iter().enumerate() {
        let line = render_operation_line(i + 1, op, out);
        out.line(&line);
    }
}

/// Node of the preview tree. Built per render call and thrown away.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProposalTreeNode {
    pub name: String,
    pub children: BTreeMap<String, ProposalTreeNode>,
    pub annotations: Vec<String>,
}

impl ProposalTreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build the tree for every path-based operation in `plan`.
    pub fn from_plan(plan: &Plan) -> Self {
        let mut root = Self::new(".");
        for op in &plan.operations {
            match &op.kind {
                OperationKind::CreateDir
                | OperationKind::CreateFile
                | OperationKind::UpdateFile => {
                    root.add_path(&op.path, op.kind.as_str());
                }
                OperationKind::Rename => {
                    root.add_path(op.rename_source(), "rename_from");
                    root.add_path(&op.to, "rename_to");
                }
                OperationKind::RunCommand | OperationKind::Unknown(_) => {}
            }
        }
        root
    }

    /// Walk/create nodes for `path` and tag the leaf. Blank and `.` paths
    /// contribute nothing.
    pub fn add_path(&mut self, path: &str, annotation: &str) {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return;
        }
        let cleaned = sandbox::clean(Path::new(trimmed));

        let mut node = self;
        let mut walked = false;
        for component in cleaned.components() {
            let part = match component {
                Component::Normal(name) => name.to_string_lossy().into_owned(),
                Component::ParentDir => "..".to_string(),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => continue,
            };
            node = node
                .children
                .entry(part.clone())
                .or_insert_with(|| ProposalTreeNode::new(part));
            walked = true;
        }

        if walked && !annotation.is_empty() {
            node.annotations.push(annotation.to_string());
        }
    }

    /// Tree lines below this node, children in lexical order.
    pub fn render_lines(&self, out: &dyn Output) -> Vec<String> {
        let mut lines = Vec::new();
        self.collect_lines("", out, &mut lines);
        lines
    }

    fn collect_lines(&self, prefix: &str, out: &dyn Output, lines: &mut Vec<String>) {
        let count = self.children.len();
        for (i, child) in self.children.values().enumerate() {
            let is_last = i + 1 == count;
            let (branch, extension) = if is_last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };

            let mut line = format!(
                "{}{}{}",
                out.paint(Style::TreeBranch, prefix),
                out.paint(Style::TreeBranch, branch),
                out.paint(Style::Path, &child.name)
            );
            let tags = format_annotations(&child.annotations, out);
            if !tags.is_empty() {
                line.push(' ');
                line.push_str(&tags);
            }
            lines.push(line);

            child.collect_lines(&format!("{}{}", prefix, extension), out, lines);
        }
    }
}

/// `[tag]` list, deduplicated, first occurrence wins.
pub fn format_annotations(annotations: &[String], out: &dyn Output) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for item in annotations {
        let key = item.trim();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
    }

    seen.iter()
        .map(|key| {
            let style = match *key {
                "create_dir" | "create_file" => Style::OpCreate,
                "update_file" => Style::OpUpdate,
                "rename_from" | "rename_to" => Style::OpRename,
                _ => Style::Muted,
            };
            out.paint(style, &format!("[{}]", key))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emit the proposal tree, or a notice when the plan touches no paths.
pub fn render_proposed_tree(plan: &Plan, out: &dyn Output) {
    let root = ProposalTreeNode::from_plan(plan);
    if root.children.is_empty() {
        out.warn("(no path-based changes to render)");
        return;
    }
    for line in root.render_lines(out) {
        out.line(&line);
    }
}
