// Workspace snapshot - the directory listing sent along with every prompt

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use super::sandbox;

/// Directories never listed (matched case-insensitively)
const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", ".idea", ".vscode"];

pub const SNAPSHOT_MAX_DEPTH: usize = 4;
pub const SNAPSHOT_MAX_ENTRIES: usize = 300;

fn is_excluded(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && EXCLUDED_DIRS.contains(&entry.file_name().to_string_lossy().to_lowercase().as_str())
}

/// List `root` as slash-separated relative paths, directories suffixed `/`.
///
/// Entries are visited in file-name order down to `max_depth`. Once
/// `max_entries` is reached the walk stops and `... (truncated)` is appended.
/// Unreadable entries are skipped silently.
pub fn collect_workspace_snapshot(root: &Path, max_depth: usize, max_entries: usize) -> String {
    let mut entries: Vec<String> = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e))
        .filter_map(|e| e.ok());

    for entry in walker {
        if entries.len() >= max_entries {
            break;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let mut rel = sandbox::to_slash(&sandbox::clean(rel));
        if rel == "." {
            continue;
        }
        if entry.file_type().is_dir() {
            rel.push('/');
        }
        entries.push(rel);
    }

    if entries.is_empty() {
        return "(workspace appears empty)".to_string();
    }
    if entries.len() >= max_entries {
        entries.push("... (truncated)".to_string());
    }
    entries.join("\n")
}

/// Context block embedded in model prompts.
pub fn build_workspace_context(working_dir: &Path) -> String {
    let snapshot =
        collect_workspace_snapshot(working_dir, SNAPSHOT_MAX_DEPTH, SNAPSHOT_MAX_ENTRIES);
    format!(
        "Current directory: {}\nWorkspace files/folders:\n{}",
        working_dir.display(),
        snapshot
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_workspace() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            collect_workspace_snapshot(dir.path(), 4, 300),
            "(workspace appears empty)"
        );
    }

    #[test]
    fn test_snapshot_lists_sorted_with_dir_suffix() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "").unwrap();

        assert_eq!(
            collect_workspace_snapshot(dir.path(), 4, 300),
            "Cargo.toml\nsrc/\nsrc/main.rs"
        );
    }

    #[test]
    fn test_snapshot_skips_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        fs::create_dir_all(dir.path().join("Node_Modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".vscode")).unwrap();
        fs::write(dir.path().join("keep.txt"), "").unwrap();

        assert_eq!(collect_workspace_snapshot(dir.path(), 4, 300), "keep.txt");
    }

    #[test]
    fn test_snapshot_respects_depth() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c/d/e")).unwrap();
        let snapshot = collect_workspace_snapshot(dir.path(), 4, 300);
        assert!(snapshot.contains("a/b/c/d/"));
        assert!(!snapshot.contains("a/b/c/d/e"));
    }

    #[test]
    fn test_snapshot_truncates_at_cap() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{}.txt", i)), "").unwrap();
        }
        let snapshot = collect_workspace_snapshot(dir.path(), 4, 3);
        assert_eq!(snapshot, "f0.txt\nf1.txt\nf2.txt\n... (truncated)");
    }

    #[test]
    fn test_context_format() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let context = build_workspace_context(dir.path());
        assert!(context.starts_with(&format!("Current directory: {}\n", dir.path().display())));
        assert!(context.ends_with("Workspace files/folders:\na.txt"));
    }
}
