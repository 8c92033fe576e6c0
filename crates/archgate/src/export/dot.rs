//! `GraphViz` DOT output.

use std::fmt::Write;

use crate::classify::ReadKind;
use crate::error::Result;
use crate::export::ModelSerializer;
use crate::graph::{Component, GraphSnapshot};
use crate::pattern::PackagePattern;

/// Renders a component graph as a DOT digraph.
///
/// One node per package, then one `subgraph` per [`ReadKind`] that has edges.
/// Edges outside the allowed group are colored by kind and labeled with
/// their reference count.
#[derive(Debug, Default)]
pub struct DotSerializer {
    snapshot: GraphSnapshot,
}

impl DotSerializer {
    /// Create an empty serializer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render an existing snapshot directly.
    #[must_use]
    pub fn render(snapshot: &GraphSnapshot) -> String {
        let mut out = String::new();
        out.push_str("digraph \"package dependencies\"\n{\n");

        for package in snapshot.packages() {
            let _ = writeln!(out, "  \"{package}\";");
        }

        for kind in ReadKind::ALL {
            write_subgraph(&mut out, snapshot, kind);
        }

        out.push('}');
        out
    }
}

impl ModelSerializer for DotSerializer {
    fn add_component(&mut self, component: &Component) {
        self.snapshot.add_component(component);
    }

    // Whitelisted packages are not drawn.
    fn add_whitelisted_pattern(&mut self, _pattern: &PackagePattern) {}

    fn serialize(&self) -> Result<String> {
        Ok(Self::render(&self.snapshot))
    }
}

fn subgraph_name(kind: ReadKind) -> &'static str {
    match kind {
        ReadKind::Allowed => "Allowed",
        ReadKind::Disallowed => "Disallowed",
        ReadKind::Cycle => "Cycle",
        ReadKind::Unknown => "Unknown",
    }
}

fn edge_color(kind: ReadKind) -> Option<&'static str> {
    match kind {
        ReadKind::Allowed => None,
        ReadKind::Disallowed => Some("red"),
        ReadKind::Cycle => Some("purple"),
        ReadKind::Unknown => Some("yellow"),
    }
}

fn write_subgraph(out: &mut String, snapshot: &GraphSnapshot, kind: ReadKind) {
    if snapshot.edge_count(kind) == 0 {
        return;
    }

    let color = edge_color(kind);
    let _ = writeln!(out, "  subgraph {} {{", subgraph_name(kind));
    if let Some(color) = color {
        let _ = writeln!(out, "    edge [color={color}, penwidth=2]");
    }

    for (from, to, count) in snapshot.edges(kind) {
        let _ = write!(out, "    \"{from}\" -> \"{to}\"");
        // Allowed edges are expected, so their counts are noise.
        if color.is_some() {
            let _ = write!(out, " [ label=\" {count}\" ]");
        }
        out.push_str(";\n");
    }

    out.push_str("  }\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ComponentGraph;

    #[test]
    fn empty_graph_renders_bare_digraph() {
        let output = ComponentGraph::new()
            .export(DotSerializer::new())
            .expect("dot export cannot fail");

        assert_eq!(output, "digraph \"package dependencies\"\n{\n}");
    }

    #[test]
    fn allowed_edges_have_no_style_or_label() {
        let mut graph = ComponentGraph::new();
        graph.record("a", "b", ReadKind::Allowed);
        graph.record("a", "b", ReadKind::Allowed);

        let output = DotSerializer::render(&graph.snapshot());

        assert!(output.contains("  subgraph Allowed {\n    \"a\" -> \"b\";\n  }\n"));
        assert!(!output.contains("label"));
        assert!(!output.contains("subgraph Disallowed"));
    }

    #[test]
    fn unknown_edges_are_yellow() {
        let mut graph = ComponentGraph::new();
        graph.record("a", "b", ReadKind::Unknown);

        let output = DotSerializer::render(&graph.snapshot());

        assert!(output.contains("  subgraph Unknown {\n    edge [color=yellow, penwidth=2]\n"));
        assert!(output.contains("    \"a\" -> \"b\" [ label=\" 1\" ];\n"));
    }
}
