//! File collection utilities for snapshot builds
//!
//! Walks a project tree (respecting `.gitignore`) and collects component
//! source candidates, filtered by extension and language support.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::warn;

use crate::Lang;

/// Directories that never contain catalog components
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "storybook-static",
    "__tests__",
    "__mocks__",
];

/// File name infixes marking tests, stories, declarations and tool configs
const SKIPPED_INFIXES: &[&str] = &[".test.", ".spec.", ".stories.", ".story.", ".d.", ".config."];

/// A candidate file with its raw content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// Collect all supported source files under a directory.
///
/// # Arguments
///
/// * `dir` - The root directory to search
/// * `max_depth` - Maximum recursion depth (0 = only root directory)
/// * `extensions` - Optional list of extensions to include (empty = all supported)
///
/// # Returns
///
/// Paths of supported source files, sorted by path.
pub fn collect_files(dir: &Path, max_depth: usize, extensions: &[String]) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .max_depth(Some(max_depth + 1))
        .filter_entry(|entry| !should_skip_path(entry.path()))
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| is_candidate(path, extensions))
        .collect();

    files.sort();
    files
}

/// Check if a path should be skipped during file collection.
///
/// Skips build output and dependency directories, plus test, story,
/// declaration and tool config files.
pub fn should_skip_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    SKIPPED_DIRS.contains(&name) || SKIPPED_INFIXES.iter().any(|infix| name.contains(infix))
}

fn is_candidate(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !extensions.is_empty() && !extensions.iter().any(|e| e.trim_start_matches('.') == ext) {
        return false;
    }
    Lang::from_extension(ext).is_ok()
}

/// Read candidate files; unreadable ones are returned separately with the reason
pub fn read_sources(paths: &[PathBuf]) -> (Vec<SourceFile>, Vec<(PathBuf, String)>) {
    let mut sources = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();

    for path in paths {
        match fs::read_to_string(path) {
            Ok(content) => sources.push(SourceFile {
                path: path.clone(),
                content,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                unreadable.push((path.clone(), e.to_string()));
            }
        }
    }

    (sources, unreadable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export {};").unwrap();
    }

    #[test]
    fn test_should_skip_dependency_dirs() {
        assert!(should_skip_path(Path::new("node_modules")));
        assert!(should_skip_path(Path::new("dist")));
        assert!(!should_skip_path(Path::new("src")));
    }

    #[test]
    fn test_should_skip_tests_and_stories() {
        assert!(should_skip_path(Path::new("Button.test.tsx")));
        assert!(should_skip_path(Path::new("Button.spec.jsx")));
        assert!(should_skip_path(Path::new("Button.stories.tsx")));
        assert!(should_skip_path(Path::new("types.d.ts")));
        assert!(should_skip_path(Path::new("tailwind.config.js")));
        assert!(!should_skip_path(Path::new("Button.tsx")));
    }

    #[test]
    fn test_collect_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/b/Card.tsx");
        touch(dir.path(), "src/a/Button.jsx");
        touch(dir.path(), "src/a/Button.stories.tsx");
        touch(dir.path(), "src/a/button.css");
        touch(dir.path(), "node_modules/lib/index.js");
        touch(dir.path(), ".cache/Hidden.tsx");

        let files = collect_files(dir.path(), 10, &[]);
        let rel: Vec<PathBuf> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![PathBuf::from("src/a/Button.jsx"), PathBuf::from("src/b/Card.tsx")]
        );

        let only_tsx = collect_files(dir.path(), 10, &["tsx".to_string()]);
        assert_eq!(only_tsx.len(), 1);
    }

    #[test]
    fn test_collect_files_respects_depth() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Top.tsx");
        touch(dir.path(), "a/b/Deep.tsx");
        assert_eq!(collect_files(dir.path(), 0, &[]).len(), 1);
        assert_eq!(collect_files(dir.path(), 2, &[]).len(), 2);
    }

    #[test]
    fn test_collect_files_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        touch(dir.path(), "generated/Icon.tsx");
        touch(dir.path(), "src/Icon.tsx");
        assert_eq!(collect_files(dir.path(), 10, &[]).len(), 1);
    }

    #[test]
    fn test_read_sources_reports_unreadable() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "A.tsx");
        let paths = vec![dir.path().join("A.tsx"), dir.path().join("Missing.tsx")];
        let (sources, unreadable) = read_sources(&paths);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].content, "export {};");
        assert_eq!(unreadable.len(), 1);
    }
}
