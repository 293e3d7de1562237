//! Pattern matching for allow-list rules
//!
//! A rule is a plain string classified by its shape:
//! - `docs/*.csv` - wildcard, exactly one `*` (prefix and suffix around it)
//! - `docs/` - directory, matches every key below it
//! - `docs/report.pdf` - exact key

use crate::error::{AccessError, Result};

/// Shape of an allow-list rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind<'a> {
    /// Single `*` splitting the rule into a prefix and a suffix
    Wildcard { prefix: &'a str, suffix: &'a str },
    /// Rule ending with `/`
    Directory,
    /// Anything else
    Exact,
}

impl<'a> PatternKind<'a> {
    /// Classify a rule
    ///
    /// A rule with more than one `*` is neither a wildcard nor a directory
    /// rule and only matches itself literally.
    pub fn classify(pattern: &'a str) -> Self {
        let mut stars = pattern.match_indices('*');
        match (stars.next(), stars.next()) {
            (Some((idx, _)), None) => PatternKind::Wildcard {
                prefix: &pattern[..idx],
                suffix: &pattern[idx + 1..],
            },
            (None, _) if pattern.ends_with('/') => PatternKind::Directory,
            _ => PatternKind::Exact,
        }
    }
}

/// Pattern matcher for object keys
pub struct PatternMatcher;

impl PatternMatcher {
    /// Check if an object key matches a rule
    ///
    /// # Examples
    /// ```
    /// use storage_access::iam::PatternMatcher;
    ///
    /// assert!(PatternMatcher::matches("docs/*", "docs/a/b.txt"));
    /// assert!(PatternMatcher::matches("docs/", "docs/a.txt"));
    /// assert!(PatternMatcher::matches("docs/a.txt", "docs/a.txt"));
    /// assert!(!PatternMatcher::matches("docs/*.csv", "docs/a.txt"));
    /// ```
    pub fn matches(pattern: &str, key: &str) -> bool {
        pattern == key || Self::matches_inherited(pattern, key)
    }

    /// Match through the wildcard or directory rules only
    ///
    /// A key matched this way gets its status from a rule covering a whole
    /// subtree rather than from a rule naming it.
    pub fn matches_inherited(pattern: &str, key: &str) -> bool {
        match PatternKind::classify(pattern) {
            PatternKind::Wildcard { prefix, suffix } => {
                key.starts_with(prefix) && (suffix.is_empty() || key.ends_with(suffix))
            }
            PatternKind::Directory => key.starts_with(pattern),
            PatternKind::Exact => false,
        }
    }

    /// Check that a rule is structurally valid
    pub fn validate(pattern: &str) -> Result<()> {
        if pattern.is_empty() {
            return Err(AccessError::invalid_pattern(pattern, "pattern cannot be empty"));
        }
        if pattern.starts_with('/') {
            return Err(AccessError::invalid_pattern(
                pattern,
                "object keys never start with /",
            ));
        }
        if pattern.matches('*').count() > 1 {
            return Err(AccessError::invalid_pattern(
                pattern,
                "at most one * wildcard is supported",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            PatternKind::classify("docs/*"),
            PatternKind::Wildcard {
                prefix: "docs/",
                suffix: ""
            }
        );
        assert_eq!(
            PatternKind::classify("logs/*.log"),
            PatternKind::Wildcard {
                prefix: "logs/",
                suffix: ".log"
            }
        );
        assert_eq!(PatternKind::classify("docs/"), PatternKind::Directory);
        assert_eq!(PatternKind::classify("docs/a.txt"), PatternKind::Exact);
        assert_eq!(PatternKind::classify("a/*/b/*"), PatternKind::Exact);
    }

    #[test]
    fn test_exact_match() {
        assert!(PatternMatcher::matches("users/alice", "users/alice"));
        assert!(!PatternMatcher::matches("users/alice", "users/bob"));
        assert!(!PatternMatcher::matches_inherited("users/alice", "users/alice"));
    }

    #[test]
    fn test_wildcard_prefix_only() {
        assert!(PatternMatcher::matches("public/*", "public/file.txt"));
        assert!(PatternMatcher::matches("public/*", "public/a/b/c.txt"));
        assert!(PatternMatcher::matches("public/*", "public/"));
        assert!(!PatternMatcher::matches("public/*", "private/file.txt"));
    }

    #[test]
    fn test_wildcard_with_suffix() {
        assert!(PatternMatcher::matches("data/*.csv", "data/a.csv"));
        assert!(PatternMatcher::matches("data/*.csv", "data/sub/b.csv"));
        assert!(!PatternMatcher::matches("data/*.csv", "data/a.json"));
        assert!(!PatternMatcher::matches("data/*.csv", "other/a.csv"));
    }

    #[test]
    fn test_bare_star_matches_everything() {
        assert!(PatternMatcher::matches("*", "anything/at/all"));
        assert!(PatternMatcher::matches("*", ""));
    }

    #[test]
    fn test_directory_match() {
        assert!(PatternMatcher::matches("docs/", "docs/readme.md"));
        assert!(PatternMatcher::matches("docs/", "docs/deep/nested/file"));
        assert!(PatternMatcher::matches("docs/", "docs/"));
        assert!(!PatternMatcher::matches("docs/", "docsx/readme.md"));
        assert!(!PatternMatcher::matches("docs/", "docs"));
    }

    #[test]
    fn test_multiple_stars_only_match_literally() {
        assert!(PatternMatcher::matches("a*b*", "a*b*"));
        assert!(!PatternMatcher::matches("a*b*", "axbx"));
    }

    #[test]
    fn test_validate() {
        assert!(PatternMatcher::validate("docs/*").is_ok());
        assert!(PatternMatcher::validate("docs/").is_ok());
        assert!(PatternMatcher::validate("docs/a.txt").is_ok());
        assert!(PatternMatcher::validate("").is_err());
        assert!(PatternMatcher::validate("/docs/").is_err());
        assert!(PatternMatcher::validate("a*b*").is_err());
    }
}
