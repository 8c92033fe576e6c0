//! Wildcard patterns over dotted package names.
//!
//! Patterns are split on `.` into segments, and each segment is one of:
//!
//! | Segment | Matches |
//! |---------|---------|
//! | `*` | one or more whole segments |
//! | `awt*`, `*Impl` | a single segment, `*` standing for any characters |
//! | `example` | exactly that segment |
//!
//! A glob segment that ends in `*` and closes the pattern also matches any
//! further trailing segments, so `java.awt*` covers `java.awt`, `java.awtx`
//! and `java.awt.color`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Any,
    Glob(String),
    Literal(String),
}

/// A parsed whitelist pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PackagePattern {
    /// Parse a pattern such as `com.vendor.*` or `java.awt*`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for an empty pattern or one that
    /// contains an empty segment (`a..b`, `.a`, `a.`).
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.trim().is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let segments = pattern
            .split('.')
            .map(|segment| match segment {
                "" => Err(invalid("empty segment")),
                "*" => Ok(Segment::Any),
                s if s.contains('*') => Ok(Segment::Glob(s.to_string())),
                s => Ok(Segment::Literal(s.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text as written in the configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `name` is covered by this pattern.
    ///
    /// Never fails; an empty or non-matching name simply yields `false`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let parts: Vec<&str> = name.split('.').collect();
        match_segments(&self.segments, &parts)
    }
}

/// Walk the pattern left to right, tracking every name prefix the pattern
/// prefix can cover. Each segment costs one pass over the name.
fn match_segments(pattern: &[Segment], name: &[&str]) -> bool {
    let mut reachable = vec![false; name.len() + 1];
    reachable[0] = true;

    for (index, segment) in pattern.iter().enumerate() {
        let is_last = index + 1 == pattern.len();
        let mut next = vec![false; name.len() + 1];

        match segment {
            Segment::Any => {
                let mut covered = false;
                for end in 1..=name.len() {
                    covered |= reachable[end - 1];
                    next[end] = covered;
                }
            }
            Segment::Literal(literal) => {
                for end in 1..=name.len() {
                    next[end] = reachable[end - 1] && name[end - 1] == literal.as_str();
                }
            }
            Segment::Glob(glob) => {
                // Trailing `foo*` swallows whatever follows.
                let swallows_rest = is_last && glob.ends_with('*');
                for end in 1..=name.len() {
                    if reachable[end - 1] && glob_matches(glob, name[end - 1]) {
                        if swallows_rest {
                            return true;
                        }
                        next[end] = true;
                    }
                }
            }
        }

        if !next.contains(&true) {
            return false;
        }
        reachable = next;
    }

    reachable[name.len()]
}

/// Match a single segment against a glob where `*` stands for any characters.
fn glob_matches(glob: &str, text: &str) -> bool {
    let parts: Vec<&str> = glob.split('*').collect();
    let Some((first, rest)) = parts.split_first() else {
        return text.is_empty();
    };
    let Some((last, middle)) = rest.split_last() else {
        return text == *first;
    };

    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last)
    {
        return false;
    }

    let mut remaining = &text[first.len()..text.len() - last.len()];
    for part in middle {
        match remaining.find(part) {
            Some(at) => remaining = &remaining[at + part.len()..],
            None => return false,
        }
    }
    true
}

impl fmt::Display for PackagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PackagePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
