//! Architectural Enforcement
//!
//! Source scanners shared by the enforcement tests in `tests/`. They check
//! rules the compiler cannot:
//! - Navigation runs on the host's frame tick, never on sleeps or threads
//! - Production code propagates or absorbs failures instead of panicking
//!
//! Everything from a file's first `#[cfg(test)]` onward counts as test code
//! and is not scanned.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["navigator/core/src", "navigator/sim/src"];

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `.rs` file below `dir`
#[must_use]
pub fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Code portion of each production line, with 1-based line numbers
///
/// Comments are stripped and scanning stops at the first `#[cfg(test)]`.
pub fn production_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
}

/// Find lines in `dirs` whose code matches any of `patterns`
#[must_use]
pub fn scan(dirs: &[&str], patterns: &[&str]) -> Vec<Violation> {
    let root = workspace_root();
    let mut violations = Vec::new();

    for dir in dirs {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }

        for file in rust_sources(&path) {
            let Ok(content) = fs::read_to_string(&file) else {
                continue;
            };
            for (line, code) in production_lines(&content) {
                if patterns.iter().any(|pattern| code.contains(pattern)) {
                    violations.push(Violation {
                        path: file.clone(),
                        line,
                        text: code.trim().to_owned(),
                    });
                }
            }
        }
    }

    violations
}

/// Panic with a readable report if `violations` is non-empty
pub fn report(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s): {rule}", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let content = "let a = 1; // .unwrap()\n#[cfg(test)]\nmod tests { x.unwrap(); }\n";
        let lines: Vec<_> = production_lines(content).collect();
        assert_eq!(lines, vec![(1, "let a = 1; ")]);
    }

    #[test]
    fn test_workspace_root_contains_navigator() {
        assert!(workspace_root().join("navigator/core/src").exists());
    }
}
