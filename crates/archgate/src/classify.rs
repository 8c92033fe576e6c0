//! Classification of observed package references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Package, PackageDependencies};

/// How a reference from one package to another relates to the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadKind {
    /// The target is in the source's allowed-reads set
    Allowed,
    /// A genuine architecture violation
    Disallowed,
    /// Not allowed directly, but both ends share a declared cycle
    Cycle,
    /// Independent runs disagreed on this reference
    Unknown,
}

impl ReadKind {
    /// All kinds in export order.
    pub const ALL: [ReadKind; 4] = [
        ReadKind::Allowed,
        ReadKind::Disallowed,
        ReadKind::Cycle,
        ReadKind::Unknown,
    ];
}

impl fmt::Display for ReadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::Disallowed => write!(f, "disallowed"),
            Self::Cycle => write!(f, "cycle"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a reference from `from` to the package named `to`.
///
/// Returns `None` when the reference is not judged at all. Rules are applied
/// in order and the first match wins:
///
/// 1. `to` is a builtin root
/// 2. `to` is whitelisted
/// 3. `from` is not configured
/// 4. `to` is `from` itself
/// 5. `to` is empty (default package)
/// 6. `from` reads `to` -> [`ReadKind::Allowed`]
/// 7. both share a declared cycle -> [`ReadKind::Cycle`]
/// 8. otherwise -> [`ReadKind::Disallowed`]
#[must_use]
pub fn classify(model: &PackageDependencies, from: &Package, to: &str) -> Option<ReadKind> {
    if model.is_builtin_root(to)
        || model.is_whitelisted(to)
        || !from.is_configured()
        || from.name() == to
        || to.is_empty()
    {
        return None;
    }

    if from.reads(to) {
        Some(ReadKind::Allowed)
    } else if model.in_same_cycle(from.name(), to) {
        Some(ReadKind::Cycle)
    } else {
        Some(ReadKind::Disallowed)
    }
}
