//! CLI command implementations.

mod display;

pub mod analyze;
pub mod cycles;
pub mod validate;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use archgate::EventReader;

/// Open a JSON Lines event stream.
fn open_events(path: &Path) -> Result<EventReader<BufReader<File>>, archgate::Error> {
    let file = File::open(path).map_err(|e| {
        archgate::Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open event stream {}: {e}", path.display()),
        ))
    })?;
    Ok(EventReader::new(BufReader::new(file)))
}
