//! Renderers for aggregated component graphs.
//!
//! Every renderer implements [`ModelSerializer`]: components, whitelist
//! patterns and builtin roots are fed in, then [`serialize`](ModelSerializer::serialize) produces
//! the document. Output never depends on the order things were added.

mod dot;
mod json;

pub use dot::DotSerializer;
pub use json::JsonSerializer;

use crate::error::Result;
use crate::graph::Component;
use crate::pattern::PackagePattern;

/// A renderer for component graphs.
pub trait ModelSerializer {
    /// Add one component and its reads.
    fn add_component(&mut self, component: &Component);

    /// Add a whitelist pattern annotation.
    fn add_whitelisted_pattern(&mut self, pattern: &PackagePattern);

    /// Add a builtin root. Renderers that do not carry roots ignore it.
    fn add_builtin_root(&mut self, _name: &str) {}

    /// Produce the rendered document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying encoder fails.
    fn serialize(&self) -> Result<String>;
}
