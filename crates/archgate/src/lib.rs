//! # Archgate: declared package architecture, enforced
//!
//! Archgate checks the references between packages of a codebase against an
//! explicitly configured dependency graph. It flags packages the
//! configuration does not declare, classifies every observed reference
//! (allowed, disallowed, part of a declared cycle), and exports the resulting
//! graph for visualization.
//!
//! Discovering references is left to the caller: a compiler plugin, a source
//! walker or anything else feeds a stream of [`Event`]s into a session.
//!
//! ## Quick Start
//!
//! ```
//! use archgate::{
//!     DotSerializer, Event, FindingKind, PackageDependencies, PackagePattern, ReportingPolicy,
//!     ValidationSession,
//! };
//!
//! let model = PackageDependencies::builder()
//!     .package("com.example.app", ["com.example.db"])
//!     .package("com.example.db", Vec::<String>::new())
//!     .whitelist(PackagePattern::parse("com.vendor.*")?)
//!     .build()?;
//!
//! let mut session = ValidationSession::new(&model, ReportingPolicy::default()).with_graph();
//! session.run([
//!     Event::enter("com.example.app"),
//!     Event::reference((), "com.example.db"),
//!     Event::reference((), "com.example.web"),
//! ])?;
//!
//! let report = session.finish();
//! assert!(matches!(
//!     &report.findings[0].kind,
//!     FindingKind::IllegalDependency { to, .. } if to == "com.example.web"
//! ));
//!
//! let dot = report.graph.expect("graph enabled").export(DotSerializer::new())?;
//! assert!(dot.contains("subgraph Disallowed"));
//! # Ok::<(), archgate::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod analyze;
pub mod classify;
pub mod config;
mod error;
pub mod event;
pub mod export;
pub mod graph;
pub mod model;
pub mod pattern;
pub mod session;

pub use analyze::{Analysis, ReferenceCollector};
pub use classify::{ReadKind, classify};
pub use config::{ConfigFile, PackageConfig};
pub use error::{Error, Result};
pub use event::{Event, EventReader, SourceLocation};
pub use export::{DotSerializer, JsonSerializer, ModelSerializer};
pub use graph::{Component, ComponentGraph, GraphSnapshot, ReadCounter};
pub use model::{Package, PackageDependencies, PackageDependenciesBuilder};
pub use pattern::PackagePattern;
pub use session::{
    CurrentPackage, Finding, FindingKind, ReportingPolicy, SessionReport, Severity,
    ValidationSession,
};
