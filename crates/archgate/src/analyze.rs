//! Deriving a configuration from observed references.
//!
//! Where validation checks references against a configuration, analysis runs
//! without one: a [`ReferenceCollector`] records every reference between
//! packages and [`finish`](ReferenceCollector::finish) turns the result into
//! a [`ConfigFile`] that would accept exactly what was observed. Edges whose
//! ends share a strongly-connected component of the observed graph are marked
//! [`ReadKind::Cycle`], everything else [`ReadKind::Allowed`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::classify::ReadKind;
use crate::config::{ConfigFile, PackageConfig};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::graph::ComponentGraph;
use crate::model::PackageDependencies;
use crate::pattern::PackagePattern;

/// Collects package references without judging them.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    whitelist: Vec<PackagePattern>,
    builtin_roots: BTreeSet<String>,
    current: Option<String>,
    reads: BTreeMap<String, BTreeMap<String, usize>>,
}

/// Result of an analysis run.
#[derive(Debug)]
pub struct Analysis {
    /// Observed graph, kinds limited to allowed and cycle
    pub graph: ComponentGraph,
    /// Configuration that legalizes the observed graph
    pub config: ConfigFile,
    /// Cycles among observed packages, sorted
    pub cycles: Vec<Vec<String>>,
}

impl ReferenceCollector {
    /// Create a collector that skips nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip references to packages matching `pattern`.
    #[must_use]
    pub fn whitelist(mut self, pattern: PackagePattern) -> Self {
        self.whitelist.push(pattern);
        self
    }

    /// Skip references to the implicit namespace `name`.
    #[must_use]
    pub fn builtin_root(mut self, name: impl Into<String>) -> Self {
        self.builtin_roots.insert(name.into());
        self
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentPackage`] for a reference that precedes
    /// every package.
    pub fn handle<L>(&mut self, event: Event<L>) -> Result<()> {
        match event {
            Event::EnterPackage { name } => {
                if !name.is_empty() {
                    self.reads.entry(name.clone()).or_default();
                }
                self.current = Some(name);
            }
            Event::ObserveReference { target, .. } => {
                let from = self.current.as_deref().ok_or(Error::NoCurrentPackage)?;
                if self.is_skipped(from, &target) {
                    return Ok(());
                }
                *self
                    .reads
                    .entry(from.to_string())
                    .or_default()
                    .entry(target)
                    .or_default() += 1;
            }
        }
        Ok(())
    }

    /// Process a whole event stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentPackage`] if the stream starts with a
    /// reference.
    pub fn run<L, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Event<L>>,
    {
        for event in events {
            self.handle(event)?;
        }
        Ok(())
    }

    fn is_skipped(&self, from: &str, to: &str) -> bool {
        from.is_empty()
            || to.is_empty()
            || from == to
            || self.builtin_roots.contains(to)
            || self.whitelist.iter().any(|pattern| pattern.matches(to))
    }

    /// Classify the observed graph and derive its configuration.
    ///
    /// # Errors
    ///
    /// Propagates model construction failures.
    pub fn finish(self) -> Result<Analysis> {
        let mut builder = PackageDependencies::builder();
        for (name, targets) in &self.reads {
            builder = builder.package(name.as_str(), targets.keys().map(String::as_str));
        }
        for pattern in &self.whitelist {
            builder = builder.whitelist(pattern.clone());
        }
        for root in &self.builtin_roots {
            builder = builder.builtin_root(root.as_str());
        }
        let model = builder.build()?;

        let mut graph = ComponentGraph::new();
        for (from, targets) in &self.reads {
            graph.add_package(from);
            for (to, count) in targets {
                let kind = if model.in_same_cycle(from, to) {
                    ReadKind::Cycle
                } else {
                    ReadKind::Allowed
                };
                graph.record_count(from, to, kind, *count);
            }
        }
        for pattern in self.whitelist {
            graph.add_whitelisted_pattern(pattern);
        }
        for root in &self.builtin_roots {
            graph.add_builtin_root(root);
        }

        let config = ConfigFile {
            packages: model
                .packages()
                .into_iter()
                .map(|package| PackageConfig {
                    name: package.name().to_string(),
                    reads: package.allowed_reads().map(str::to_string).collect(),
                })
                .collect(),
            whitelisted: model.whitelist().iter().map(|p| p.as_str().to_string()).collect(),
            builtin_roots: model.builtin_roots().map(str::to_string).collect(),
        };

        debug!(
            packages = config.packages.len(),
            cycles = model.cycles().len(),
            "Analysis finished"
        );

        Ok(Analysis {
            graph,
            config,
            cycles: model.cycles().to_vec(),
        })
    }
}
