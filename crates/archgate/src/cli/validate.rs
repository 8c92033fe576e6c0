//! `archgate validate` command implementation.

use std::fs;
use std::path::Path;

use archgate::{DotSerializer, ReportingPolicy, ValidationSession, config};
use tracing::info;

use super::{display, open_events};

/// Run the validate command.
///
/// Returns `Ok(false)` when any finding has error severity.
pub fn run(
    config_path: &Path,
    events_path: &Path,
    policy: ReportingPolicy,
    visualize: Option<&Path>,
) -> Result<bool, archgate::Error> {
    let model = config::load(config_path)?
        .map(|config| config.to_model())
        .transpose()?;

    let mut session = ValidationSession::with_optional_model(model.as_ref(), policy);
    if visualize.is_some() {
        session = session.with_graph();
    }

    if session.config_is_valid() {
        for event in open_events(events_path)? {
            session.handle(event?)?;
        }
    }

    let report = session.finish();
    display::print_findings(&report.findings);
    display::print_summary(&report.findings);

    if let (Some(path), Some(graph)) = (visualize, &report.graph) {
        fs::write(path, graph.export(DotSerializer::new())?)?;
        info!(path = %path.display(), "Wrote dependency graph");
    }

    Ok(!report.has_errors())
}
