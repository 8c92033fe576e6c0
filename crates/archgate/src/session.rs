//! Validation sessions.
//!
//! A [`ValidationSession`] consumes the observations of one analysis run and
//! collects [`Finding`]s. Two styles of driving it are supported:
//!
//! - **Typed**: [`enter_package`](ValidationSession::enter_package) hands back a
//!   [`CurrentPackage`] that is passed to every
//!   [`observe_reference`](ValidationSession::observe_reference) call, so a
//!   reference without a package cannot be expressed.
//! - **Event stream**: [`handle`](ValidationSession::handle) accepts raw
//!   [`Event`]s and tracks the current package itself, failing with
//!   [`Error::NoCurrentPackage`] when the stream is out of order.
//!
//! Sessions own their deduplication state and, optionally, a
//! [`ComponentGraph`]. The model is only borrowed, so many sessions may share
//! one [`PackageDependencies`] across threads.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::classify::{ReadKind, classify};
use crate::error::{Error, Result};
use crate::event::{Event, SourceLocation};
use crate::graph::ComponentGraph;
use crate::model::{Package, PackageDependencies};

/// How seriously a finding should be taken by the embedding tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the build
    Error,
    /// Reported but not fatal
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            other => Err(format!("unknown severity '{other}' (expected error or warning)")),
        }
    }
}

/// Severity assigned to each category of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPolicy {
    /// Severity of [`FindingKind::IllegalDependency`]
    pub illegal_dependency: Severity,
    /// Severity of [`FindingKind::UnconfiguredPackage`]
    pub unconfigured_package: Severity,
}

impl Default for ReportingPolicy {
    fn default() -> Self {
        Self {
            illegal_dependency: Severity::Error,
            unconfigured_package: Severity::Warning,
        }
    }
}

/// What a finding is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind<L = SourceLocation> {
    /// `from` references `to` without being allowed to
    IllegalDependency {
        /// Referencing package
        from: String,
        /// Referenced package
        to: String,
        /// Where the reference occurs
        location: L,
    },
    /// A package was entered that the configuration does not declare
    UnconfiguredPackage {
        /// Package name
        name: String,
    },
    /// There was no configuration to validate against
    MissingConfiguration,
}

impl<L> fmt::Display for FindingKind<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalDependency { from, to, .. } => {
                write!(f, "package {from} must not read package {to}")
            }
            Self::UnconfiguredPackage { name } => {
                write!(f, "package {name} is not declared in the dependency configuration")
            }
            Self::MissingConfiguration => write!(f, "no dependency configuration found"),
        }
    }
}

/// A validation outcome tagged with its severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding<L = SourceLocation> {
    /// Severity from the session's [`ReportingPolicy`]
    pub severity: Severity,
    /// The finding itself
    pub kind: FindingKind<L>,
}

impl<L> Finding<L> {
    /// Whether this finding should fail the build.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// The package whose references are currently being observed.
#[derive(Debug, Clone)]
pub struct CurrentPackage<'m> {
    model: &'m PackageDependencies,
    package: Cow<'m, Package>,
}

impl CurrentPackage<'_> {
    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.package.name()
    }

    /// Whether the package is declared in the configuration.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.package.is_configured()
    }
}

/// Stateful validation of one event stream.
#[derive(Debug)]
pub struct ValidationSession<'m, L = SourceLocation> {
    model: Option<&'m PackageDependencies>,
    policy: ReportingPolicy,
    reported_unconfigured: HashSet<String>,
    findings: Vec<Finding<L>>,
    current: Option<CurrentPackage<'m>>,
    graph: Option<ComponentGraph>,
}

impl<'m, L> ValidationSession<'m, L> {
    /// Start a session against `model`.
    #[must_use]
    pub fn new(model: &'m PackageDependencies, policy: ReportingPolicy) -> Self {
        Self::with_optional_model(Some(model), policy)
    }

    /// Start a session whose configuration may be absent.
    ///
    /// Without a model the session records a single fatal
    /// [`FindingKind::MissingConfiguration`] and rejects every event.
    #[must_use]
    pub fn with_optional_model(
        model: Option<&'m PackageDependencies>,
        policy: ReportingPolicy,
    ) -> Self {
        let mut findings = Vec::new();
        if model.is_none() {
            debug!("Validation session has no configuration");
            findings.push(Finding {
                severity: Severity::Error,
                kind: FindingKind::MissingConfiguration,
            });
        }

        Self {
            model,
            policy,
            reported_unconfigured: HashSet::new(),
            findings,
            current: None,
            graph: None,
        }
    }

    /// Also aggregate every classified reference into a [`ComponentGraph`].
    #[must_use]
    pub fn with_graph(mut self) -> Self {
        let mut graph = ComponentGraph::new();
        if let Some(model) = self.model {
            for pattern in model.whitelist() {
                graph.add_whitelisted_pattern(pattern.clone());
            }
            for root in model.builtin_roots() {
                graph.add_builtin_root(root);
            }
        }
        self.graph = Some(graph);
        self
    }

    /// Whether the session has a configuration to validate against.
    #[must_use]
    pub fn config_is_valid(&self) -> bool {
        self.model.is_some()
    }

    /// Enter package `name`; the returned handle is the context for the
    /// references that follow.
    ///
    /// The first time an undeclared package is entered an
    /// [`FindingKind::UnconfiguredPackage`] finding is recorded. The empty
    /// name stands for the default package and is never reported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfiguration`] if the session has no model.
    pub fn enter_package(&mut self, name: &str) -> Result<CurrentPackage<'m>> {
        let model = self.model.ok_or(Error::MissingConfiguration)?;
        let package = model.get_package(name);

        if !package.is_configured()
            && !name.is_empty()
            && self.reported_unconfigured.insert(name.to_string())
        {
            debug!(package = name, "Entered unconfigured package");
            self.findings.push(Finding {
                severity: self.policy.unconfigured_package,
                kind: FindingKind::UnconfiguredPackage {
                    name: name.to_string(),
                },
            });
        }

        if let Some(graph) = self.graph.as_mut()
            && !name.is_empty()
        {
            graph.add_package(name);
        }

        Ok(CurrentPackage { model, package })
    }

    /// Observe a reference from `current` to package `to`.
    ///
    /// Every disallowed reference yields its own finding; nothing is
    /// deduplicated here. Returns the classification, `None` meaning the
    /// reference is not judged.
    pub fn observe_reference(
        &mut self,
        current: &CurrentPackage<'m>,
        location: L,
        to: &str,
    ) -> Option<ReadKind> {
        let kind = classify(current.model, &current.package, to);

        if let (Some(kind), Some(graph)) = (kind, self.graph.as_mut()) {
            graph.record(current.name(), to, kind);
        }

        if kind == Some(ReadKind::Disallowed) {
            trace!(from = current.name(), to, "Illegal package reference");
            self.findings.push(Finding {
                severity: self.policy.illegal_dependency,
                kind: FindingKind::IllegalDependency {
                    from: current.name().to_string(),
                    to: to.to_string(),
                    location,
                },
            });
        }

        kind
    }

    /// Process one raw event, tracking the current package internally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfiguration`] if the session has no model and
    /// [`Error::NoCurrentPackage`] for a reference that precedes every
    /// package.
    pub fn handle(&mut self, event: Event<L>) -> Result<Option<ReadKind>> {
        match event {
            Event::EnterPackage { name } => {
                let current = self.enter_package(&name)?;
                self.current = Some(current);
                Ok(None)
            }
            Event::ObserveReference { location, target } => {
                if !self.config_is_valid() {
                    return Err(Error::MissingConfiguration);
                }
                let current = self.current.take().ok_or(Error::NoCurrentPackage)?;
                let kind = self.observe_reference(&current, location, &target);
                self.current = Some(current);
                Ok(kind)
            }
        }
    }

    /// Process a whole event stream.
    ///
    /// A session without configuration consumes nothing and returns `Ok`; its
    /// only finding is the missing configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentPackage`] if the stream starts with a
    /// reference.
    pub fn run<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Event<L>>,
    {
        if !self.config_is_valid() {
            return Ok(());
        }
        for event in events {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Findings so far, in the order they were produced.
    #[must_use]
    pub fn findings(&self) -> &[Finding<L>] {
        &self.findings
    }

    /// Whether any finding has [`Severity::Error`].
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    /// The aggregated graph, if enabled with [`with_graph`](Self::with_graph).
    #[must_use]
    pub fn graph(&self) -> Option<&ComponentGraph> {
        self.graph.as_ref()
    }

    /// End the session.
    #[must_use]
    pub fn finish(self) -> SessionReport<L> {
        debug!(
            findings = self.findings.len(),
            unconfigured = self.reported_unconfigured.len(),
            "Validation session finished"
        );
        SessionReport {
            findings: self.findings,
            graph: self.graph,
        }
    }
}

/// Everything a finished session produced.
#[derive(Debug)]
pub struct SessionReport<L = SourceLocation> {
    /// Findings in production order
    pub findings: Vec<Finding<L>>,
    /// Aggregated graph, if one was requested
    pub graph: Option<ComponentGraph>,
}

impl<L> SessionReport<L> {
    /// Whether any finding has [`Severity::Error`].
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }
}
