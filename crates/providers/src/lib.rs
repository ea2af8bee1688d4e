//! Provider implementations for RailSage.
//!
//! Generation providers implement `railsage_core::Provider`; embedders
//! implement `railsage_core::Embedder`. The factory builds both from
//! configuration, wrapped in per-call timeouts.

pub mod embedder;
pub mod factory;
pub mod openai_compat;
pub mod timeout;

pub use embedder::{HashEmbedder, RemoteEmbedder};
pub use factory::{build_embedder, build_from_config};
pub use openai_compat::OpenAiCompatProvider;
pub use timeout::{TimeoutEmbedder, TimeoutProvider};
