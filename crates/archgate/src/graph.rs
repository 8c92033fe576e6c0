//! Aggregation of observed references into a component graph.
//!
//! A [`ComponentGraph`] counts how often each package read each other package
//! and remembers the [`ReadKind`] assigned to the pair. It is the input for
//! every [`ModelSerializer`](crate::export::ModelSerializer).
//!
//! All collections are ordered by package name so snapshots and exports never
//! depend on the order events arrived in.

use std::collections::{BTreeMap, BTreeSet};

use crate::classify::ReadKind;
use crate::error::Result;
use crate::export::ModelSerializer;
use crate::pattern::PackagePattern;

/// Number of references to one target, and how they were classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCounter {
    count: usize,
    kind: ReadKind,
}

impl ReadCounter {
    /// Number of observed references (at least 1).
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Classification of the references.
    #[must_use]
    pub fn kind(&self) -> ReadKind {
        self.kind
    }
}

/// A package and the packages it was observed reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    name: String,
    reads: BTreeMap<String, ReadCounter>,
}

impl Component {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reads: BTreeMap::new(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read targets with their counters, sorted by target name.
    pub fn reads(&self) -> impl Iterator<Item = (&str, &ReadCounter)> {
        self.reads.iter().map(|(target, counter)| (target.as_str(), counter))
    }

    /// Counter for a single target.
    #[must_use]
    pub fn read(&self, target: &str) -> Option<&ReadCounter> {
        self.reads.get(target)
    }
}

/// Per-package read counts collected during one or more sessions.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    components: BTreeMap<String, Component>,
    whitelisted: Vec<PackagePattern>,
    builtin_roots: BTreeSet<String>,
}

impl ComponentGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `name` has a component, even if it never reads anything.
    pub fn add_package(&mut self, name: &str) {
        if !self.components.contains_key(name) {
            self.components.insert(name.to_string(), Component::new(name));
        }
    }

    /// Count one reference from `from` to `to`.
    ///
    /// The kind passed with the first reference of a pair sticks; callers
    /// classify with a fixed model, so later calls always agree with it.
    pub fn record(&mut self, from: &str, to: &str, kind: ReadKind) {
        self.record_count(from, to, kind, 1);
    }

    pub(crate) fn record_count(&mut self, from: &str, to: &str, kind: ReadKind, count: usize) {
        let component = self
            .components
            .entry(from.to_string())
            .or_insert_with(|| Component::new(from));

        component
            .reads
            .entry(to.to_string())
            .and_modify(|counter| counter.count += count)
            .or_insert(ReadCounter { count, kind });
    }

    /// Remember a whitelist pattern for export. Adds no edges.
    pub fn add_whitelisted_pattern(&mut self, pattern: PackagePattern) {
        if !self.whitelisted.contains(&pattern) {
            self.whitelisted.push(pattern);
        }
    }

    /// Remember a builtin root for export. Adds no edges.
    pub fn add_builtin_root(&mut self, name: &str) {
        self.builtin_roots.insert(name.to_string());
    }

    /// Fold in a graph from an independent run.
    ///
    /// Counts of the same pair are summed. A pair the two runs classified
    /// differently becomes [`ReadKind::Unknown`].
    pub fn merge(&mut self, other: ComponentGraph) {
        for (name, other_component) in other.components {
            let component = self
                .components
                .entry(name)
                .or_insert_with_key(|name| Component::new(name));

            for (target, theirs) in other_component.reads {
                component
                    .reads
                    .entry(target)
                    .and_modify(|ours| {
                        ours.count += theirs.count;
                        if ours.kind != theirs.kind {
                            ours.kind = ReadKind::Unknown;
                        }
                    })
                    .or_insert(theirs);
            }
        }

        for pattern in other.whitelisted {
            self.add_whitelisted_pattern(pattern);
        }
        self.builtin_roots.extend(other.builtin_roots);
    }

    /// Components, sorted by package name.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// The component for `name`, if it was entered or read anything.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Recorded whitelist patterns.
    #[must_use]
    pub fn whitelisted(&self) -> &[PackagePattern] {
        &self.whitelisted
    }

    /// Recorded builtin roots, sorted.
    pub fn builtin_roots(&self) -> impl Iterator<Item = &str> {
        self.builtin_roots.iter().map(String::as_str)
    }

    /// Whether no package has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Immutable, fully sorted view of the graph.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        for component in self.components() {
            snapshot.add_component(component);
        }
        for pattern in &self.whitelisted {
            snapshot.add_whitelisted_pattern(pattern);
        }
        snapshot
    }

    /// Render the graph with `serializer`.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn export<S: ModelSerializer>(&self, mut serializer: S) -> Result<String> {
        for component in self.components() {
            serializer.add_component(component);
        }
        for pattern in &self.whitelisted {
            serializer.add_whitelisted_pattern(pattern);
        }
        for root in &self.builtin_roots {
            serializer.add_builtin_root(root);
        }
        serializer.serialize()
    }
}

/// Sorted view of a component graph, grouped by [`ReadKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    packages: BTreeSet<String>,
    reads: BTreeMap<ReadKind, BTreeMap<String, BTreeMap<String, usize>>>,
    whitelisted: BTreeSet<String>,
}

impl GraphSnapshot {
    /// Add a component's edges. Both ends of every edge become packages.
    pub fn add_component(&mut self, component: &Component) {
        self.packages.insert(component.name.clone());

        for (target, counter) in &component.reads {
            self.packages.insert(target.clone());
            self.reads
                .entry(counter.kind)
                .or_default()
                .entry(component.name.clone())
                .or_default()
                .insert(target.clone(), counter.count);
        }
    }

    /// Add a whitelist pattern annotation.
    pub fn add_whitelisted_pattern(&mut self, pattern: &PackagePattern) {
        self.whitelisted.insert(pattern.as_str().to_string());
    }

    /// Every package seen as source or target, sorted.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    /// Edges of one kind as `(from, to, count)`, sorted by `from` then `to`.
    pub fn edges(&self, kind: ReadKind) -> impl Iterator<Item = (&str, &str, usize)> {
        self.reads.get(&kind).into_iter().flat_map(|by_source| {
            by_source.iter().flat_map(|(from, targets)| {
                targets
                    .iter()
                    .map(move |(to, count)| (from.as_str(), to.as_str(), *count))
            })
        })
    }

    /// Number of edges of one kind.
    #[must_use]
    pub fn edge_count(&self, kind: ReadKind) -> usize {
        self.reads
            .get(&kind)
            .map_or(0, |by_source| by_source.values().map(BTreeMap::len).sum())
    }

    /// Whitelist pattern texts, sorted.
    pub fn whitelisted(&self) -> impl Iterator<Item = &str> {
        self.whitelisted.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_repeated_pairs() {
        let mut graph = ComponentGraph::new();
        graph.record("a", "b", ReadKind::Allowed);
        graph.record("a", "b", ReadKind::Allowed);
        graph.record("a", "c", ReadKind::Disallowed);

        let a = graph.component("a").expect("component a should exist");
        assert_eq!(a.read("b").map(ReadCounter::count), Some(2));
        assert_eq!(a.read("c").map(ReadCounter::kind), Some(ReadKind::Disallowed));
        assert!(graph.component("b").is_none());
    }

    #[test]
    fn record_keeps_first_kind() {
        let mut graph = ComponentGraph::new();
        graph.record("a", "b", ReadKind::Allowed);
        graph.record("a", "b", ReadKind::Disallowed);

        let counter = graph
            .component("a")
            .and_then(|c| c.read("b"))
            .expect("counter should exist");
        assert_eq!(counter.kind(), ReadKind::Allowed);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn merge_sums_counts_and_marks_disagreement_unknown() {
        let mut first = ComponentGraph::new();
        first.record("a", "b", ReadKind::Allowed);
        first.record("a", "c", ReadKind::Disallowed);

        let mut second = ComponentGraph::new();
        second.record("a", "b", ReadKind::Allowed);
        second.record("a", "c", ReadKind::Allowed);
        second.record("d", "a", ReadKind::Disallowed);

        first.merge(second);

        let a = first.component("a").expect("component a should exist");
        assert_eq!(a.read("b").map(|c| (c.count(), c.kind())), Some((2, ReadKind::Allowed)));
        assert_eq!(a.read("c").map(|c| (c.count(), c.kind())), Some((2, ReadKind::Unknown)));
        assert!(first.component("d").is_some());
    }

    #[test]
    fn whitelisted_patterns_are_deduplicated() {
        let mut graph = ComponentGraph::new();
        let pattern = PackagePattern::parse("com.vendor.*").expect("valid pattern");
        graph.add_whitelisted_pattern(pattern.clone());
        graph.add_whitelisted_pattern(pattern);

        assert_eq!(graph.whitelisted().len(), 1);
        assert!(graph.is_empty());
    }

    #[test]
    fn added_package_without_reads_is_a_node() {
        let mut graph = ComponentGraph::new();
        graph.record("a", "b", ReadKind::Allowed);
        graph.add_package("a");
        graph.add_package("leaf");

        let a = graph.component("a").expect("component a should exist");
        assert_eq!(a.read("b").map(ReadCounter::count), Some(1));
        assert_eq!(graph.component("leaf").map(|c| c.reads().count()), Some(0));
        assert_eq!(
            graph.snapshot().packages().collect::<Vec<_>>(),
            vec!["a", "b", "leaf"]
        );
    }

    #[test]
    fn merge_unions_builtin_roots() {
        let mut first = ComponentGraph::new();
        first.add_builtin_root("java.lang");
        let mut second = ComponentGraph::new();
        second.add_builtin_root("kotlin");
        second.add_builtin_root("java.lang");

        first.merge(second);

        assert_eq!(first.builtin_roots().collect::<Vec<_>>(), vec!["java.lang", "kotlin"]);
    }

    #[test]
    fn snapshot_groups_edges_by_kind() {
        let mut graph = ComponentGraph::new();
        graph.record("b", "a", ReadKind::Disallowed);
        graph.record("a", "c", ReadKind::Allowed);
        graph.record("a", "b", ReadKind::Allowed);

        let snapshot = graph.snapshot();

        assert_eq!(snapshot.packages().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(
            snapshot.edges(ReadKind::Allowed).collect::<Vec<_>>(),
            vec![("a", "b", 1), ("a", "c", 1)]
        );
        assert_eq!(snapshot.edge_count(ReadKind::Disallowed), 1);
        assert_eq!(snapshot.edge_count(ReadKind::Cycle), 0);
        assert_eq!(snapshot.edges(ReadKind::Cycle).count(), 0);
    }
}
