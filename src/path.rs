//! Dotted node-path patterns
//!
//! A pattern is a dot-separated list of segments. `*` matches exactly one
//! segment and `**` matches zero or more. A concrete path may itself contain
//! `*` segments, which match any single pattern segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty path pattern")]
    Empty,

    #[error("empty segment in path pattern {0:?}")]
    EmptySegment(String),

    #[error("invalid wildcard {segment:?} in path pattern {pattern:?}")]
    InvalidWildcard { pattern: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Segment {
    Name(String),
    Any,
    AnyDepth,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw {
            "*" => Segment::Any,
            "**" => Segment::AnyDepth,
            name => Segment::Name(name.to_string()),
        }
    }

    fn accepts(&self, concrete: &str) -> bool {
        match self {
            Segment::Any => true,
            Segment::AnyDepth => false,
            Segment::Name(name) => concrete == "*" || name == concrete,
        }
    }
}

/// A validated, pre-split path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse and validate a pattern such as `Computer.**.Port`
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        let mut segments = Vec::new();
        for raw in pattern.split('.') {
            if raw.is_empty() {
                return Err(PatternError::EmptySegment(pattern.to_string()));
            }
            if raw.contains('*') && raw != "*" && raw != "**" {
                return Err(PatternError::InvalidWildcard {
                    pattern: pattern.to_string(),
                    segment: raw.to_string(),
                });
            }
            segments.push(Segment::parse(raw));
        }
        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Build a pattern without validation; malformed segments match literally
    fn lenient(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            segments: pattern.split('.').map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| !matches!(s, Segment::Name(_)))
    }

    /// Last segment, the tag name for non-wildcard patterns
    pub fn name(&self) -> &str {
        self.source.rsplit('.').next().unwrap_or(&self.source)
    }

    /// Match a concrete dotted path against this pattern
    pub fn matches(&self, concrete: &str) -> bool {
        let path: Vec<&str> = concrete.split('.').collect();
        let pat = &self.segments;

        let mut i = 0;
        let mut j = 0;
        // Most recent `**` and the path index it started consuming from
        let mut star: Option<(usize, usize)> = None;

        while i < path.len() {
            if j < pat.len() && pat[j] == Segment::AnyDepth {
                star = Some((j, i));
                j += 1;
            } else if j < pat.len() && pat[j].accepts(path[i]) {
                i += 1;
                j += 1;
            } else if let Some((star_j, star_i)) = star {
                j = star_j + 1;
                i = star_i + 1;
                star = Some((star_j, star_i + 1));
            } else {
                return false;
            }
        }

        while j < pat.len() && pat[j] == Segment::AnyDepth {
            j += 1;
        }
        j == pat.len()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Match `concrete` against `pattern`
pub fn matches(concrete: &str, pattern: &str) -> bool {
    PathPattern::lenient(pattern).matches(concrete)
}

/// Segment-wise equality where `*` on either side matches one segment
pub fn equal_path(a: &str, b: &str) -> bool {
    let a: Vec<&str> = a.split('.').collect();
    let b: Vec<&str> = b.split('.').collect();
    a.len() == b.len()
        && a
            .iter()
            .zip(&b)
            .all(|(x, y)| x == y || *x == "*" || *y == "*")
}

/// Whether `pattern` can describe a direct child of `parent`
pub fn is_direct_parent(parent: &str, pattern: &str) -> bool {
    matches(&format!("{}.*", parent), pattern)
}
