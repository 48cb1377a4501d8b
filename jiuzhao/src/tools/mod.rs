//! Capabilities the model can invoke through the action envelope.

use anyhow::Result;

use crate::core::arguments::ArgumentBag;
use crate::core::types::ToolOutcome;

pub mod file_system;
pub mod lean;
pub mod registry;
pub mod search;

pub use registry::ToolRegistry;

/// A named, self-describing unit of action.
///
/// Expected failures (bad arguments, missing files, compiler errors) are
/// returned as [`ToolOutcome::Failure`]. An `Err` is reserved for unexpected
/// failures; the registry converts it to text.
pub trait Tool {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Example envelope shown to the model.
    fn usage(&self) -> &str;

    fn execute(&self, args: &ArgumentBag) -> Result<ToolOutcome>;

    /// Catalog entry: name, description, then usage.
    fn definition(&self) -> String {
        format!(
            "Name: {}\nDescription: {}\nUsage:\n{}",
            self.name(),
            self.description(),
            self.usage()
        )
    }
}
