// Path sandbox - every plan path must stay inside the working directory
//
// Pure path arithmetic: nothing here touches the filesystem, so a path that
// does not exist yet resolves the same way as one that does.

use std::path::{Component, Path, PathBuf};

use crate::errors::SandboxError;

/// Resolve a model-supplied path against `working_dir`.
///
/// Relative paths are joined onto `working_dir`, the result is cleaned
/// lexically, and anything whose relative form starts with `..` is rejected.
pub fn resolve(working_dir: &Path, raw_path: &str) -> Result<PathBuf, SandboxError> {
    let value = raw_path.trim();
    if value.is_empty() {
        return Err(SandboxError::EmptyPath);
    }

    let base = clean(working_dir);
    let candidate = Path::new(value);
    let target = if candidate.is_absolute() {
        clean(candidate)
    } else {
        clean(&base.join(candidate))
    };

    let rel = relative_to(&base, &target);
    if matches!(rel.components().next(), Some(Component::ParentDir)) {
        return Err(SandboxError::PathEscape(value.to_string()));
    }

    Ok(target)
}

/// Lexically clean a path: drop `.` segments, fold `name/..` pairs, and
/// clamp `..` at the root of absolute paths. An empty result becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Relative path from `base` to `target`, both already cleaned.
///
/// Shared leading components are dropped; every remaining `base` component
/// becomes a `..`. Returns `.` when the two are equal.
pub fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();

    let shared = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in shared..base.len() {
        rel.push("..");
    }
    for component in &target[shared..] {
        rel.push(component.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rel
    }
}

/// Cleaned path rendered with `/` separators, for display and tree keys.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\work\repo")
        } else {
            PathBuf::from("/work/repo")
        }
    }

    #[test]
    fn test_resolve_simple_relative() {
        let resolved = resolve(&root(), "src/main.rs").unwrap();
        assert_eq!(resolved, root().join("src").join("main.rs"));
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        let resolved = resolve(&root(), "  notes.txt \n").unwrap();
        assert_eq!(resolved, root().join("notes.txt"));
    }

    #[test]
    fn test_resolve_empty_path() {
        assert_eq!(resolve(&root(), "   "), Err(SandboxError::EmptyPath));
    }

    #[test]
    fn test_resolve_dot_is_working_dir() {
        assert_eq!(resolve(&root(), ".").unwrap(), root());
        assert_eq!(resolve(&root(), "a/..").unwrap(), root());
    }

    #[test]
    fn test_resolve_internal_parent_segments_stay_inside() {
        let resolved = resolve(&root(), "a/b/../c/./d.txt").unwrap();
        assert_eq!(resolved, root().join("a").join("c").join("d.txt"));
    }

    #[test]
    fn test_resolve_rejects_parent_escape() {
        for raw in ["..", "../x", "a/../../x", "./../repo2/file"] {
            assert!(
                matches!(resolve(&root(), raw), Err(SandboxError::PathEscape(_))),
                "expected escape for {raw}"
            );
        }
    }

    #[test]
    fn test_resolve_rejects_sibling_with_shared_prefix() {
        // "/work/repo-other" shares a string prefix with "/work/repo" but is outside it
        let raw = if cfg!(windows) {
            r"C:\work\repo-other\x"
        } else {
            "/work/repo-other/x"
        };
        assert!(matches!(
            resolve(&root(), raw),
            Err(SandboxError::PathEscape(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_absolute_inside_and_outside() {
        assert_eq!(
            resolve(&root(), "/work/repo/docs/a.md").unwrap(),
            root().join("docs").join("a.md")
        );
        assert!(matches!(
            resolve(&root(), "/etc/passwd"),
            Err(SandboxError::PathEscape(_))
        ));
    }

    #[test]
    fn test_resolve_dotdot_prefixed_name_is_allowed() {
        let resolved = resolve(&root(), "..hidden").unwrap();
        assert_eq!(resolved, root().join("..hidden"));
    }

    #[test]
    fn test_clean_relative_paths() {
        assert_eq!(clean(Path::new("a//b/./c/")), PathBuf::from("a/b/c"));
        assert_eq!(clean(Path::new("a/../b")), PathBuf::from("b"));
        assert_eq!(clean(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(clean(Path::new("")), PathBuf::from("."));
        assert_eq!(clean(Path::new("a/..")), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_clamps_at_root() {
        assert_eq!(clean(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/a/b"), Path::new("/a/b/c")),
            PathBuf::from("c")
        );
        assert_eq!(
            relative_to(Path::new("/a/b"), Path::new("/a/x")),
            PathBuf::from("../x")
        );
        assert_eq!(relative_to(Path::new("/a"), Path::new("/a")), PathBuf::from("."));
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("a/b/c.txt")), "a/b/c.txt");
    }
}
