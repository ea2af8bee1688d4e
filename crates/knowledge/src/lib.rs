//! Reference knowledge for RailSage.
//!
//! Loads reference documents, splits them into overlapping chunks, embeds
//! them into a [`VectorIndex`], and serves top-k similarity retrieval at
//! query time.

pub mod chunker;
pub mod index;
pub mod loader;
pub mod vector;

pub use chunker::{CharSpan, DocumentChunk, chunk_document, chunk_documents};
pub use index::{BuildLock, IndexBuilder, IndexManifest, ScoredChunk, VectorIndex};
pub use loader::{SourceDocument, load_documents};
pub use vector::{cosine_similarity, rank_top_k};
