//! The declared dependency architecture.
//!
//! [`PackageDependencies`] holds every configured [`Package`] with the set of
//! packages it may read, the whitelist patterns exempt from checking, and the
//! builtin roots of the host language. It is built once and is read-only
//! afterwards, so a single instance can back any number of concurrent
//! validation sessions.
//!
//! ## Cycle detection
//!
//! Strongly-connected components of the *configured* allowed-reads graph are
//! computed with Tarjan's algorithm when the model is built. Only components
//! with more than one member count as cycles; edges pointing at packages that
//! are not themselves configured are left out of the graph.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pattern::PackagePattern;

/// A package and the packages it is allowed to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    configured: bool,
    reads: BTreeSet<String>,
}

impl Package {
    /// A configured package with its allowed reads.
    pub fn configured<I, S>(name: impl Into<String>, reads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            configured: true,
            reads: reads.into_iter().map(Into::into).collect(),
        }
    }

    /// A placeholder for a package the configuration does not mention.
    pub fn unconfigured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configured: false,
            reads: BTreeSet::new(),
        }
    }

    /// Fully-qualified package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the package was declared in the configuration.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Whether this package may read `target`.
    #[must_use]
    pub fn reads(&self, target: &str) -> bool {
        self.reads.contains(target)
    }

    /// The allowed-reads set, sorted.
    pub fn allowed_reads(&self) -> impl Iterator<Item = &str> {
        self.reads.iter().map(String::as_str)
    }
}

/// The configured dependency graph plus whitelist.
#[derive(Debug, Clone, Default)]
pub struct PackageDependencies {
    packages: HashMap<String, Package>,
    whitelist: Vec<PackagePattern>,
    builtin_roots: BTreeSet<String>,
    /// Package name -> index into `cycles`, for members of non-trivial SCCs.
    cycle_of: HashMap<String, usize>,
    cycles: Vec<Vec<String>>,
}

impl PackageDependencies {
    /// Start building a model.
    #[must_use]
    pub fn builder() -> PackageDependenciesBuilder {
        PackageDependenciesBuilder::default()
    }

    /// Look up a package.
    ///
    /// Configured packages are borrowed from the model. Anything else comes
    /// back as an owned unconfigured placeholder; the model itself is never
    /// mutated, so "report once" bookkeeping belongs to the session.
    #[must_use]
    pub fn get_package(&self, name: &str) -> Cow<'_, Package> {
        match self.packages.get(name) {
            Some(package) => Cow::Borrowed(package),
            None => Cow::Owned(Package::unconfigured(name)),
        }
    }

    /// Whether `name` is declared in the configuration.
    #[must_use]
    pub fn is_configured(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Whether `name` matches any whitelist pattern.
    #[must_use]
    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.iter().any(|pattern| pattern.matches(name))
    }

    /// Whether `name` is one of the host language's implicit namespaces.
    #[must_use]
    pub fn is_builtin_root(&self, name: &str) -> bool {
        self.builtin_roots.contains(name)
    }

    /// Whether configured package `from` may read `to`.
    #[must_use]
    pub fn reads(&self, from: &str, to: &str) -> bool {
        self.packages
            .get(from)
            .is_some_and(|package| package.reads(to))
    }

    /// Whether `from` and `to` sit in the same non-trivial strongly-connected
    /// component of the configured graph.
    #[must_use]
    pub fn in_same_cycle(&self, from: &str, to: &str) -> bool {
        match (self.cycle_of.get(from), self.cycle_of.get(to)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Declared cycles: each one sorted by name, the list sorted by first member.
    #[must_use]
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    /// Whitelist patterns in configuration order.
    #[must_use]
    pub fn whitelist(&self) -> &[PackagePattern] {
        &self.whitelist
    }

    /// Builtin-root package names, sorted.
    pub fn builtin_roots(&self) -> impl Iterator<Item = &str> {
        self.builtin_roots.iter().map(String::as_str)
    }

    /// Configured packages, sorted by name.
    #[must_use]
    pub fn packages(&self) -> Vec<&Package> {
        let mut packages: Vec<_> = self.packages.values().collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages
    }
}

/// Builder for [`PackageDependencies`].
#[derive(Debug, Default)]
pub struct PackageDependenciesBuilder {
    packages: Vec<Package>,
    whitelist: Vec<PackagePattern>,
    builtin_roots: BTreeSet<String>,
}

impl PackageDependenciesBuilder {
    /// Declare a package and the packages it may read.
    #[must_use]
    pub fn package<I, S>(mut self, name: impl Into<String>, reads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.push(Package::configured(name, reads));
        self
    }

    /// Exempt packages matching `pattern` from validation.
    #[must_use]
    pub fn whitelist(mut self, pattern: PackagePattern) -> Self {
        self.whitelist.push(pattern);
        self
    }

    /// Register an implicit namespace that is never reported (e.g. `java.lang`).
    #[must_use]
    pub fn builtin_root(mut self, name: impl Into<String>) -> Self {
        self.builtin_roots.insert(name.into());
        self
    }

    /// Finish the model and compute its cycle index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePackage`] if a package name was declared twice.
    pub fn build(self) -> Result<PackageDependencies> {
        let mut packages = HashMap::with_capacity(self.packages.len());
        for package in self.packages {
            if packages.contains_key(&package.name) {
                return Err(Error::DuplicatePackage(package.name));
            }
            packages.insert(package.name.clone(), package);
        }

        let cycles = find_cycles(&packages);
        let cycle_of = cycles
            .iter()
            .enumerate()
            .flat_map(|(index, members)| members.iter().map(move |name| (name.clone(), index)))
            .collect();

        debug!(
            packages = packages.len(),
            whitelisted = self.whitelist.len(),
            cycles = cycles.len(),
            "Built dependency model"
        );

        Ok(PackageDependencies {
            packages,
            whitelist: self.whitelist,
            builtin_roots: self.builtin_roots,
            cycle_of,
            cycles,
        })
    }
}

/// Non-trivial SCCs of the configured allowed-reads graph.
fn find_cycles(packages: &HashMap<String, Package>) -> Vec<Vec<String>> {
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(packages.len(), 0);
    let node_map: HashMap<&str, NodeIndex> = packages
        .keys()
        .map(|name| (name.as_str(), graph.add_node(name.as_str())))
        .collect();

    for package in packages.values() {
        let Some(&from) = node_map.get(package.name.as_str()) else {
            continue;
        };
        for target in &package.reads {
            // Reads of unconfigured packages cannot close a declared cycle.
            if let Some(&to) = node_map.get(target.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut members: Vec<String> = component
                .into_iter()
                .map(|node| graph[node].to_string())
                .collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();
    cycles
}
