//! View name matching
//!
//! A view lookup key is either an exact element name (served from the view
//! index) or a regular expression tested against every registered view name.

use regex::Regex;

use crate::error::Result;

/// Lookup key for resolving definitions by view name
#[derive(Debug, Clone)]
pub enum ViewPattern {
    /// Exact view name, e.g. "section"
    Exact(String),
    /// Regular expression over view names, e.g. `^h[1-6]$`
    Regex(Regex),
}

impl ViewPattern {
    /// Create an exact-name pattern
    pub fn exact(name: impl Into<String>) -> Self {
        ViewPattern::Exact(name.into())
    }

    /// Compile a regular-expression pattern
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(ViewPattern::Regex(Regex::new(pattern)?))
    }

    /// Whether `candidate` is matched by this pattern
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            ViewPattern::Exact(name) => name == candidate,
            ViewPattern::Regex(regex) => regex.is_match(candidate),
        }
    }

    /// The exact name, if this is not a regular expression
    pub fn as_exact(&self) -> Option<&str> {
        match self {
            ViewPattern::Exact(name) => Some(name),
            ViewPattern::Regex(_) => None,
        }
    }
}

impl From<&str> for ViewPattern {
    fn from(name: &str) -> Self {
        ViewPattern::Exact(name.to_string())
    }
}

impl From<String> for ViewPattern {
    fn from(name: String) -> Self {
        ViewPattern::Exact(name)
    }
}

impl From<Regex> for ViewPattern {
    fn from(regex: Regex) -> Self {
        ViewPattern::Regex(regex)
    }
}

impl std::fmt::Display for ViewPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewPattern::Exact(name) => f.write_str(name),
            ViewPattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}
