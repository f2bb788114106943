//! Patterns compiled once when the model is built
//!
//! Both types compare, print and serialize as their source text, so the hint
//! model stays comparable and can cross the worker channel. An invalid
//! pattern is kept as text and never matches.

use globset::{Glob, GlobMatcher};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Regex from a `ConditionAttributes match="..."` attribute
#[derive(Clone)]
pub struct ValuePattern {
    source: String,
    regex: Option<Regex>,
}

impl ValuePattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let regex = Regex::new(&source).ok();
        Self { source, regex }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(value))
    }
}

/// Glob over workspace-relative paths, from a `fileTriggerPattern` attribute
#[derive(Clone)]
pub struct FileTrigger {
    source: String,
    matcher: Option<GlobMatcher>,
}

impl FileTrigger {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let matcher = Glob::new(&source).ok().map(|g| g.compile_matcher());
        Self { source, matcher }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn is_match(&self, relative_path: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(relative_path))
    }
}

macro_rules! source_text_impls {
    ($ty:ident) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.source == other.source
            }
        }

        impl Eq for $ty {}

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($ty), self.source)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.source)
            }
        }

        impl From<&str> for $ty {
            fn from(source: &str) -> Self {
                Self::new(source)
            }
        }

        impl From<String> for $ty {
            fn from(source: String) -> Self {
                Self::new(source)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.source)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

source_text_impls!(ValuePattern);
source_text_impls!(FileTrigger);
