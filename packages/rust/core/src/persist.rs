//! Writing documents under the docs output root.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument};
use uuid::Uuid;

use prdocs_shared::{DocumentArtifact, PrDocsError, Result};

/// Extension appended to every changed file's name.
const DOC_EXTENSION: &str = "md";

/// Writes documentation artifacts to `<root>/<filename>.md`.
#[derive(Debug, Clone)]
pub struct DocPersister {
    root: PathBuf,
}

impl DocPersister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the document path for `filename`, refusing anything that
    /// could land outside the root.
    pub fn doc_path(&self, filename: &str) -> Result<PathBuf> {
        let relative = Path::new(filename);

        let safe = !filename.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
            && relative.components().any(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(PrDocsError::persistence(
                &self.root,
                format!("refusing unsafe document name {filename:?}"),
            ));
        }

        Ok(self.root.join(format!("{filename}.{DOC_EXTENSION}")))
    }

    /// Write `artifact` for `filename`, overwriting any previous document.
    ///
    /// The root and intermediate directories are created as needed. The body
    /// lands via temp file + rename so readers never see a partial write.
    #[instrument(skip_all, fields(filename = %filename))]
    pub async fn persist(&self, artifact: &DocumentArtifact, filename: &str) -> Result<PathBuf> {
        let target = self.doc_path(filename)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PrDocsError::persistence(&self.root, e))?;

        let parent = target.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| PrDocsError::persistence(&parent, e))?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = parent.join(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

        tokio::fs::write(&temp, artifact.body.as_bytes())
            .await
            .map_err(|e| PrDocsError::persistence(&temp, e))?;

        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(PrDocsError::persistence(&target, e));
        }

        debug!(path = %target.display(), bytes = artifact.body.len(), "wrote document");
        Ok(target)
    }
}
