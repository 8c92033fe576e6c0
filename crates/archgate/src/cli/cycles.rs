//! `archgate cycles` command implementation.

use std::path::Path;

use archgate::config;
use colored::Colorize;

/// Run the cycles command.
pub fn run(config_path: &Path) -> Result<(), archgate::Error> {
    let Some(config) = config::load(config_path)? else {
        return Err(archgate::Error::MissingConfiguration);
    };
    let model = config.to_model()?;

    let cycles = model.cycles();
    if cycles.is_empty() {
        println!("{}", "No circular dependencies declared.".green());
        return Ok(());
    }

    println!(
        "Found {} declared circular dependencies:",
        cycles.len().to_string().red().bold()
    );
    println!();

    for (i, cycle) in cycles.iter().enumerate() {
        println!("  {} {}:", "Cycle".yellow().bold(), i + 1);
        println!("    {}", cycle.join(", ").dimmed());
    }

    Ok(())
}
