//! The railway assistant's tools.
//!
//! Two heterogeneous capabilities behind the uniform [`Tool`] interface:
//!
//! - [`TrainScheduleTool`] (`Train Schedule DB`): structured lookup in the
//!   SQLite train store
//! - [`RailwayRulesTool`] (`Railway Rules`): retrieval-augmented answers from
//!   the reference-document index

pub mod railway_rules;
pub mod train_schedule;

pub use railway_rules::RailwayRulesTool;
pub use train_schedule::{TrainScheduleTool, extract_terms};

use railsage_core::error::ToolError;
use railsage_core::tool::{Tool, ToolRegistry};

/// Build the registry the agent routes between. The schedule lookup is
/// listed first.
pub fn railway_registry(
    schedule: TrainScheduleTool,
    rules: RailwayRulesTool,
) -> Result<ToolRegistry, ToolError> {
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(schedule), Box::new(rules)];
    ToolRegistry::from_tools(tools)
}
