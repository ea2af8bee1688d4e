//! Reference document loading.

use railsage_core::error::IndexError;
use std::path::Path;
use tracing::{debug, info};

const EXTENSIONS: &[&str] = &["txt", "md"];

/// A named reference text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

/// Load every `.txt` / `.md` file directly under `dir`, sorted by file name.
pub async fn load_documents(dir: &Path) -> Result<Vec<SourceDocument>, IndexError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| IndexError::Io(format!("Failed to read {}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| IndexError::Io(e.to_string()))?
    {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if supported && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| IndexError::Io(format!("Failed to read {}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(document = %name, chars = text.chars().count(), "Loaded reference document");
        docs.push(SourceDocument { name, text });
    }

    info!(dir = %dir.display(), documents = docs.len(), "Loaded reference documents");
    Ok(docs)
}
