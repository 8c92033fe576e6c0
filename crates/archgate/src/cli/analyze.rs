//! `archgate analyze` command implementation.

use std::fs;
use std::path::Path;

use archgate::{DotSerializer, PackagePattern, ReferenceCollector};
use colored::Colorize;
use tracing::info;

use super::open_events;

/// Run the analyze command.
pub fn run(
    events_path: &Path,
    whitelist: &[String],
    builtin_roots: &[String],
    config_out: Option<&Path>,
    visualize: Option<&Path>,
) -> Result<(), archgate::Error> {
    let mut collector = ReferenceCollector::new();
    for pattern in whitelist {
        collector = collector.whitelist(PackagePattern::parse(pattern)?);
    }
    for root in builtin_roots {
        collector = collector.builtin_root(root.as_str());
    }

    for event in open_events(events_path)? {
        collector.handle(event?)?;
    }
    let analysis = collector.finish()?;

    let json = analysis.config.to_json()?;
    match config_out {
        Some(path) => {
            fs::write(path, json)?;
            info!(path = %path.display(), "Wrote derived configuration");
        }
        None => println!("{json}"),
    }

    if let Some(path) = visualize {
        fs::write(path, analysis.graph.export(DotSerializer::new())?)?;
        info!(path = %path.display(), "Wrote dependency graph");
    }

    if !analysis.cycles.is_empty() {
        eprintln!(
            "{}: observed {} circular dependencies",
            "warning".yellow().bold(),
            analysis.cycles.len()
        );
    }

    Ok(())
}
