//! # RailSage Core
//!
//! Domain types, traits, and error definitions for the RailSage railway
//! assistant. This crate has **no framework dependencies**: it defines the
//! seams that the rest of the workspace implements against.
//!
//! ## Seams
//!
//! - [`Provider`]: text generation (reasoning and answer synthesis)
//! - [`Embedder`]: text → vector mapping, with a recorded identity
//! - [`Tool`]: a uniform text-in / text-out capability for the agent
//!
//! Implementations live in their respective crates so they can be swapped via
//! configuration and replaced by scripted mocks in tests.

pub mod embedding;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use embedding::{Embedder, EmbedderIdentity};
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{Tool, ToolRegistry, ToolResult};
