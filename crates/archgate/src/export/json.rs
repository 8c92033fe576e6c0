//! Configuration-file output.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{ConfigFile, PackageConfig};
use crate::error::Result;
use crate::export::ModelSerializer;
use crate::graph::Component;
use crate::pattern::PackagePattern;

/// Renders a component graph as a [`ConfigFile`] JSON document.
///
/// Every component reads every target it was observed reading, whatever the
/// kind, so the output is the configuration under which the observed graph
/// would be legal. Whitelist patterns and builtin roots are carried through.
#[derive(Debug, Default)]
pub struct JsonSerializer {
    packages: BTreeMap<String, BTreeSet<String>>,
    whitelisted: BTreeSet<String>,
    builtin_roots: BTreeSet<String>,
}

impl JsonSerializer {
    /// Create an empty serializer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration collected so far.
    #[must_use]
    pub fn to_config(&self) -> ConfigFile {
        ConfigFile {
            packages: self
                .packages
                .iter()
                .map(|(name, reads)| PackageConfig {
                    name: name.clone(),
                    reads: reads.iter().cloned().collect(),
                })
                .collect(),
            whitelisted: self.whitelisted.iter().cloned().collect(),
            builtin_roots: self.builtin_roots.iter().cloned().collect(),
        }
    }
}

impl ModelSerializer for JsonSerializer {
    fn add_component(&mut self, component: &Component) {
        let reads = self.packages.entry(component.name().to_string()).or_default();
        for (target, _) in component.reads() {
            reads.insert(target.to_string());
        }
    }

    fn add_whitelisted_pattern(&mut self, pattern: &PackagePattern) {
        self.whitelisted.insert(pattern.as_str().to_string());
    }

    fn add_builtin_root(&mut self, name: &str) {
        self.builtin_roots.insert(name.to_string());
    }

    fn serialize(&self) -> Result<String> {
        self.to_config().to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ReadKind;
    use crate::config::ConfigFormat;
    use crate::graph::ComponentGraph;

    #[test]
    fn output_reads_back_as_configuration() {
        let mut graph = ComponentGraph::new();
        graph.record("b", "c", ReadKind::Disallowed);
        graph.record("a", "b", ReadKind::Allowed);
        graph.record("a", "b", ReadKind::Allowed);
        graph.add_whitelisted_pattern(PackagePattern::parse("com.vendor.*").expect("valid pattern"));
        graph.add_builtin_root("java.lang");

        let json = graph
            .export(JsonSerializer::new())
            .expect("json export should succeed");
        let config = ConfigFile::parse(&json, ConfigFormat::Json).expect("output should parse");

        let names: Vec<_> = config.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(config.packages[0].reads, vec!["b".to_string()]);
        assert_eq!(config.packages[1].reads, vec!["c".to_string()]);
        assert_eq!(config.whitelisted, vec!["com.vendor.*".to_string()]);
        assert_eq!(config.builtin_roots, vec!["java.lang".to_string()]);
    }
}
