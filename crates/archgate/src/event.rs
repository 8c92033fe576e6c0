//! Observation events fed to sessions by the external reference discoverer.

use std::fmt;
use std::io::BufRead;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One observation from the front end walking the source tree.
///
/// `L` is an opaque location token. The engine never inspects it and only
/// hands it back inside findings so the caller can render a position.
///
/// As JSON, events are tagged by an `event` field:
///
/// ```json
/// {"event":"enter_package","name":"com.example.app"}
/// {"event":"observe_reference","location":{"file":"App.java","line":3},"target":"com.example.db"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event<L = SourceLocation> {
    /// The following references originate in package `name`.
    EnterPackage {
        /// Fully-qualified package name
        name: String,
    },
    /// The current package references package `target`.
    ObserveReference {
        /// Where the reference occurs
        location: L,
        /// Referenced package name (empty for the default package)
        target: String,
    },
}

impl<L> Event<L> {
    /// Shorthand for [`Event::EnterPackage`].
    pub fn enter(name: impl Into<String>) -> Self {
        Self::EnterPackage { name: name.into() }
    }

    /// Shorthand for [`Event::ObserveReference`].
    pub fn reference(location: L, target: impl Into<String>) -> Self {
        Self::ObserveReference {
            location,
            target: target.into(),
        }
    }
}

/// File position used by the command-line front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// 1-based column, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}:{column}", self.file, self.line),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// Reads events from JSON Lines data, one event per line.
///
/// Blank lines are skipped. Line numbers are tracked so a decoding failure
/// points at the offending line.
pub struct EventReader<R, L = SourceLocation> {
    reader: R,
    line_number: usize,
    buffer: String,
    _location: PhantomData<fn() -> L>,
}

impl<R: BufRead, L: DeserializeOwned> EventReader<R, L> {
    /// Wrap a buffered reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
            _location: PhantomData,
        }
    }

    /// 1-based number of the last line read, 0 before any read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead, L: DeserializeOwned> Iterator for EventReader<R, L> {
    type Item = Result<Event<L>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line_number += 1,
                Err(e) => return Some(Err(Error::Io(e))),
            }

            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }

            return Some(serde_json::from_str(line).map_err(|source| Error::InvalidEvent {
                line: self.line_number,
                source,
            }));
        }
    }
}
