//! File storage. Saves and loads documents under a storage directory
//! through a [`DocumentCodec`].

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::codec::{AasJsonCodec, DocumentCodec};
use crate::document::Document;
use crate::error::{AasError, Result};

pub const DEFAULT_EXTENSION: &str = ".json";

/// What a save or load touched, for the result message.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub filename: String,
    pub submodels: usize,
    pub elements: usize,
    pub concepts: usize,
}

impl FileSummary {
    fn of(filename: &str, doc: &Document) -> Self {
        Self {
            filename: filename.to_string(),
            submodels: doc.submodels.len(),
            elements: doc.element_count(),
            concepts: doc.concept_descriptions.len(),
        }
    }
}

pub struct Storage<C: DocumentCodec = AasJsonCodec> {
    root: PathBuf,
    codec: C,
}

impl Storage<AasJsonCodec> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_codec(root, AasJsonCodec)
    }
}

impl<C: DocumentCodec> Storage<C> {
    pub fn with_codec(root: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            root: root.into(),
            codec,
        }
    }

    /// Resolve a caller-supplied filename inside the storage root.
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let rel = Path::new(filename);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if filename.trim().is_empty() || escapes {
            return Err(AasError::InvalidPath(filename.to_string()));
        }
        Ok(self.root.join(rel))
    }

    /// Write the whole document. Appends `.json` when missing and overwrites
    /// any existing file.
    pub fn save(&self, doc: &Document, filename: &str) -> Result<FileSummary> {
        if doc.shell.is_none() {
            return Err(AasError::NoShell);
        }
        let filename = if filename.ends_with(DEFAULT_EXTENSION) {
            filename.to_string()
        } else {
            format!("{}{}", filename, DEFAULT_EXTENSION)
        };
        let path = self.resolve(&filename)?;
        let bytes = self.codec.serialize(doc)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        info!("Saved document to {}", path.display());

        Ok(FileSummary::of(&filename, doc))
    }

    /// Read a document. A file without a shell still loads; callers decide
    /// what that means.
    pub fn load(&self, filename: &str) -> Result<Document> {
        let path = self.resolve(filename)?;
        if !path.is_file() {
            return Err(AasError::FileNotFound(filename.to_string()));
        }
        let bytes = std::fs::read(&path)?;
        let doc = self.codec.deserialize(&bytes)?;
        info!(
            "Loaded {} ({} submodels, {} concepts)",
            path.display(),
            doc.submodels.len(),
            doc.concept_descriptions.len()
        );
        Ok(doc)
    }

    /// Load into `doc`, replacing it entirely. Reports `NoAasFound` when the
    /// file held no shell; the document is still replaced in that case.
    pub fn load_into(&self, doc: &mut Document, filename: &str) -> Result<FileSummary> {
        let loaded = self.load(filename)?;
        let summary = FileSummary::of(filename, &loaded);
        let has_shell = loaded.shell.is_some();
        doc.replace_with(loaded);
        if has_shell {
            Ok(summary)
        } else {
            Err(AasError::NoAasFound(filename.to_string()))
        }
    }
}
