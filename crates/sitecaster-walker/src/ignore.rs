// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

/// A single ignore pattern.
#[derive(Debug, Clone)]
struct Pattern {
    /// The pattern as written, minus comments/whitespace.
    text: String,
    /// Whether the pattern contains a `/` — if so it matches the full
    /// relative path; otherwise it matches any basename.
    anchored: bool,
}

/// A parsed set of ignore patterns, ready to test paths against.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Parse newline-separated patterns: `#` comments and blank lines are
    /// skipped; negation is not supported.
    pub fn parse(text: &str) -> Self {
        let patterns = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| Pattern { anchored: line.contains('/'), text: line.trim_matches('/').to_string() })
            .collect();
        Self { patterns }
    }

    /// Load from a file; a missing ignore file is treated as an empty set —
    /// it is normal for a site tree to have none.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::empty()),
            Err(err) => Err(err),
        }
    }

    /// Does any pattern match `rel` (a path relative to the walk root)?
    /// `is_dir` only affects whether pruning applies at the caller level —
    /// matching itself is identical for files and directories.
    pub fn matches(&self, rel: &Path, is_dir: bool) -> bool {
        let _ = is_dir;
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        let basename = rel.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

        self.patterns.iter().any(|p| {
            if p.anchored {
                glob_match(&p.text, &rel_str)
            } else {
                glob_match(&p.text, &basename)
            }
        })
    }
}

/// Minimal glob matcher: `*` matches a run of non-slash bytes, everything
/// else is literal. No `**`, no character classes, no negation.
fn glob_match(pattern: &str, text: &str) -> bool {
    glob_match_bytes(pattern.as_bytes(), text.as_bytes())
}

fn glob_match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => {
            // Try consuming 0..=N non-slash bytes of `text` before the rest
            // of the pattern; `*` itself never crosses a `/`.
            let mut end = 0;
            while end <= text.len() && (end == 0 || text[end - 1] != b'/') {
                if glob_match_bytes(&pattern[1..], &text[end..]) {
                    return true;
                }
                if end == text.len() || text[end] == b'/' {
                    break;
                }
                end += 1;
            }
            false
        }
        Some(&c) => match text.first() {
            Some(&t) if t == c => glob_match_bytes(&pattern[1..], &text[1..]),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn unanchored_pattern_matches_any_basename() {
        let set = IgnoreSet::parse("*.log\n");
        assert!(set.matches(&p("a.log"), false));
        assert!(set.matches(&p("deep/nested/a.log"), false));
        assert!(!set.matches(&p("a.txt"), false));
    }

    #[test]
    fn anchored_pattern_matches_full_relative_path() {
        let set = IgnoreSet::parse("assets/tmp/*.tmp\n");
        assert!(set.matches(&p("assets/tmp/a.tmp"), false));
        assert!(!set.matches(&p("other/tmp/a.tmp"), false));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let set = IgnoreSet::parse("# comment\n\n*.log\n");
        assert_eq!(set.patterns.len(), 1);
    }

    #[test]
    fn directory_name_pattern_matches_basename() {
        let set = IgnoreSet::parse("node_modules\n");
        assert!(set.matches(&p("node_modules"), true));
        assert!(set.matches(&p("src/node_modules"), true));
    }

    #[test]
    fn star_does_not_cross_slash() {
        let set = IgnoreSet::parse("a/*/c\n");
        assert!(set.matches(&p("a/b/c"), false));
        assert!(!set.matches(&p("a/b/d/c"), false));
    }
}
