//! The vector index: build, retrieve, persist, load.
//!
//! An index is built once from a fixed chunk set, persisted to a directory,
//! and loaded read-only at query time. It records the identity of the
//! embedder that built it; loading or querying with any other embedder is a
//! configuration error.
//!
//! On-disk layout:
//!
//! ```text
//! <dir>/manifest.json   format_version, embedder, chunk_count, built_at, checksum
//! <dir>/chunks.json     chunks with their vectors, in insertion order
//! <dir>/.build.lock     holder pid and start time, present while a build is writing
//! ```

use crate::chunker::{DocumentChunk, chunk_documents};
use crate::loader::SourceDocument;
use crate::vector::rank_top_k;
use chrono::{DateTime, Utc};
use railsage_core::embedding::{Embedder, EmbedderIdentity};
use railsage_core::error::IndexError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const LOCK_FILE: &str = ".build.lock";

/// Metadata describing a persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedder: EmbedderIdentity,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
    /// sha256 hex of `chunks.json`
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// A retrieved chunk and its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a DocumentChunk,
    pub score: f32,
}

/// An immutable collection of `(embedding, chunk)` pairs.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    identity: EmbedderIdentity,
    entries: Vec<IndexEntry>,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Embed `chunks` in batches of `batch_size` and record the embedder's
    /// identity.
    pub async fn build(
        chunks: Vec<DocumentChunk>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        let identity = embedder.identity().clone();
        let batch_size = batch_size.max(1);
        let mut entries = Vec::with_capacity(chunks.len());

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| IndexError::Embedding(e.to_string()))?;

            if vectors.len() != batch.len() {
                return Err(IndexError::Embedding(format!(
                    "embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(vectors) {
                if embedding.len() != identity.dimensions {
                    return Err(IndexError::DimensionMismatch {
                        expected: identity.dimensions,
                        actual: embedding.len(),
                    });
                }
                entries.push(IndexEntry {
                    chunk: chunk.clone(),
                    embedding,
                });
            }

            debug!(batch = batch_no, embedded = entries.len(), "Embedded chunk batch");
        }

        info!(chunks = entries.len(), embedder = %identity, "Built vector index");

        Ok(Self {
            identity,
            entries,
            built_at: Utc::now(),
        })
    }

    pub fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Fail unless `identity` is the embedder this index was built with.
    pub fn check_identity(&self, identity: &EmbedderIdentity) -> Result<(), IndexError> {
        if &self.identity != identity {
            return Err(IndexError::EmbedderMismatch {
                recorded: self.identity.to_string(),
                configured: identity.to_string(),
            });
        }
        Ok(())
    }

    /// The `k` chunks most similar to `query_embedding`, best first.
    ///
    /// Deterministic: equal scores keep insertion order. An empty index or
    /// `k == 0` yields an empty result.
    pub fn retrieve(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk<'_>>, IndexError> {
        if query_embedding.len() != self.identity.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.identity.dimensions,
                actual: query_embedding.len(),
            });
        }

        let ranked = rank_top_k(
            self.entries.iter().map(|e| e.embedding.as_slice()),
            query_embedding,
            k,
        );

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: &self.entries[i].chunk,
                score,
            })
            .collect())
    }

    /// Embed `query` with `embedder` and retrieve. The embedder identity is
    /// checked before any embedding call is made.
    pub async fn retrieve_text(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk<'_>>, IndexError> {
        self.check_identity(embedder.identity())?;

        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = embedder
            .embed(query)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        self.retrieve(&query_embedding, k)
    }

    /// Write the index to `dir`. Each file goes to a temporary name first and
    /// is renamed into place; the manifest is written last.
    pub fn persist(&self, dir: &Path) -> Result<IndexManifest, IndexError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| IndexError::Io(format!("Failed to create {}: {e}", dir.display())))?;

        let chunks_bytes = serde_json::to_vec(&self.entries)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedder: self.identity.clone(),
            chunk_count: self.entries.len(),
            built_at: self.built_at,
            checksum: sha256_hex(&chunks_bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;

        write_atomic(&dir.join(CHUNKS_FILE), &chunks_bytes)?;
        write_atomic(&dir.join(MANIFEST_FILE), &manifest_bytes)?;

        info!(
            dir = %dir.display(),
            chunks = manifest.chunk_count,
            embedder = %manifest.embedder,
            "Persisted vector index"
        );

        Ok(manifest)
    }

    /// Read only the manifest of a persisted index.
    pub fn read_manifest(dir: &Path) -> Result<IndexManifest, IndexError> {
        let path = dir.join(MANIFEST_FILE);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexError::NotFound(dir.display().to_string()));
            }
            Err(e) => return Err(IndexError::Io(format!("Failed to read {}: {e}", path.display()))),
        };

        let manifest: IndexManifest = serde_json::from_slice(&bytes)
            .map_err(|e| IndexError::Corrupt(format!("unreadable manifest: {e}")))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(IndexError::Corrupt(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }

        Ok(manifest)
    }

    /// Load a persisted index for use with an embedder of `identity`.
    ///
    /// The identity is checked against the manifest before the chunk file is
    /// read. Nothing is re-embedded.
    pub fn load(dir: &Path, identity: &EmbedderIdentity) -> Result<Self, IndexError> {
        let manifest = Self::read_manifest(dir)?;

        if &manifest.embedder != identity {
            return Err(IndexError::EmbedderMismatch {
                recorded: manifest.embedder.to_string(),
                configured: identity.to_string(),
            });
        }

        let path = dir.join(CHUNKS_FILE);
        let chunks_bytes = std::fs::read(&path).map_err(|e| {
            IndexError::Corrupt(format!("missing or unreadable {}: {e}", path.display()))
        })?;

        if sha256_hex(&chunks_bytes) != manifest.checksum {
            return Err(IndexError::Corrupt("chunk file checksum mismatch".into()));
        }

        let entries: Vec<IndexEntry> = serde_json::from_slice(&chunks_bytes)
            .map_err(|e| IndexError::Corrupt(format!("unreadable chunk file: {e}")))?;

        if entries.len() != manifest.chunk_count {
            return Err(IndexError::Corrupt(format!(
                "manifest lists {} chunks, file has {}",
                manifest.chunk_count,
                entries.len()
            )));
        }

        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != identity.dimensions) {
            return Err(IndexError::Corrupt(format!(
                "chunk {} has {} dimensions, expected {}",
                bad.chunk.id,
                bad.embedding.len(),
                identity.dimensions
            )));
        }

        info!(dir = %dir.display(), chunks = entries.len(), embedder = %identity, "Loaded vector index");

        Ok(Self {
            identity: manifest.embedder,
            entries,
            built_at: manifest.built_at,
        })
    }
}

/// Builds an index from source documents into a directory, one build per
/// directory at a time.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    chunk_size: usize,
    chunk_overlap: usize,
    batch_size: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 32,
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Chunk `docs`, embed, and persist into `dir`.
    ///
    /// Holds `<dir>/.build.lock` for the duration; a second build targeting
    /// the same directory fails with `BuildInProgress` while the first one's
    /// process is alive.
    pub async fn build_to(
        &self,
        dir: &Path,
        docs: &[SourceDocument],
        embedder: &dyn Embedder,
    ) -> Result<(VectorIndex, IndexManifest), IndexError> {
        let _lock = BuildLock::acquire(dir)?;

        let chunks = chunk_documents(docs, self.chunk_size, self.chunk_overlap);
        info!(
            documents = docs.len(),
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            overlap = self.chunk_overlap,
            "Chunked reference documents"
        );

        let index = VectorIndex::build(chunks, embedder, self.batch_size).await?;
        let manifest = index.persist(dir)?;
        Ok((index, manifest))
    }
}

/// Exclusive build lock, released on drop.
///
/// The lock file records the holder's pid and start time. A lock left by a
/// process that no longer exists (killed, crashed) is taken over; a lock
/// whose holder cannot be read is respected and must be cleared with
/// [`BuildLock::clear`].
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    pub fn acquire(dir: &Path) -> Result<Self, IndexError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| IndexError::Io(format!("Failed to create {}: {e}", dir.display())))?;

        let path = dir.join(LOCK_FILE);
        match Self::create(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                match read_holder(&path) {
                    Some(pid) if !process_alive(pid) => {
                        warn!(path = %path.display(), pid, "Taking over stale build lock");
                        std::fs::remove_file(&path).map_err(|e| {
                            IndexError::Io(format!("Failed to remove {}: {e}", path.display()))
                        })?;
                        Self::create(&path).map_err(|e| lock_error(&path, e))?;
                    }
                    _ => return Err(IndexError::BuildInProgress(path.display().to_string())),
                }
            }
            other => other.map_err(|e| lock_error(&path, e))?,
        }
        Ok(Self { path })
    }

    /// Remove the lock in `dir` regardless of who holds it. Returns whether a
    /// lock was present.
    pub fn clear(dir: &Path) -> Result<bool, IndexError> {
        let path = dir.join(LOCK_FILE);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(IndexError::Io(format!("Failed to remove {}: {e}", path.display()))),
        }
    }

    fn create(path: &Path) -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "{}\n{}", std::process::id(), Utc::now().to_rfc3339()).inspect_err(|_| {
            let _ = std::fs::remove_file(path);
        })
    }
}

fn lock_error(path: &Path, e: std::io::Error) -> IndexError {
    if e.kind() == std::io::ErrorKind::AlreadyExists {
        IndexError::BuildInProgress(path.display().to_string())
    } else {
        IndexError::Io(format!("Failed to create {}: {e}", path.display()))
    }
}

/// The pid on the first line of a lock file.
fn read_holder(path: &Path) -> Option<u32> {
    let text = std::fs::read_to_string(path).ok()?;
    text.lines().next()?.trim().parse().ok()
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No portable liveness check; treat the holder as running.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release build lock");
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)
        .map_err(|e| IndexError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| IndexError::Io(format!("Failed to rename into {}: {e}", path.display())))
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}
