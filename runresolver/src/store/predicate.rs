//! Name predicates for context queries.

use regex::Regex;

/// Filters contexts by name.
#[derive(Debug, Clone, Default)]
pub enum NamePredicate {
    /// Matches every name.
    #[default]
    Any,
    /// Matches one exact name.
    Exact(String),
    /// Matches names starting with the prefix.
    Prefix(String),
    /// Matches names the regular expression finds a match in.
    Pattern(Regex),
}

impl NamePredicate {
    /// Creates an exact-name predicate.
    #[must_use]
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    /// Creates a prefix predicate.
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Compiles a pattern predicate.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Returns true if `name` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => name == expected,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Pattern(re) => re.is_match(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix() {
        let exact = NamePredicate::exact("p.p_end");
        assert!(exact.matches("p.p_end"));
        assert!(!exact.matches("p.p_end2"));

        let prefix = NamePredicate::prefix("p.");
        assert!(prefix.matches("p.p_end"));
        assert!(!prefix.matches("q.q_end"));
    }

    #[test]
    fn test_pattern() {
        let predicate = NamePredicate::pattern(r"^run-\d{3}$").unwrap();
        assert!(predicate.matches("run-001"));
        assert!(!predicate.matches("run-1"));
        assert!(NamePredicate::pattern("(").is_err());
    }

    #[test]
    fn test_default_matches_everything() {
        assert!(NamePredicate::default().matches(""));
    }
}
