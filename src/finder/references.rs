//! External "find references" providers
//!
//! A [`ReferenceProvider`] answers "where is the symbol at this position used"
//! with precise locations, typically from a language server. Providers are
//! optional; every failure is contained by the usage finder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::symbol::location::{FileLocation, Position};

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("Reference provider unavailable: {0}")]
    Unavailable(String),

    #[error("Reference request failed: {0}")]
    Request(String),

    #[error("Failed to read references from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Semantic reference lookup at a position in a document
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceProvider: Send + Sync {
    /// Locations referring to the symbol at `position` (0-based) in `file`
    async fn find_references(
        &self,
        file: &Path,
        position: Position,
    ) -> Result<Vec<FileLocation>, ReferenceError>;
}

/// References exported by a language server as a JSON array of LSP `Location`s,
/// e.g. the raw result of a `textDocument/references` request.
///
/// The export is tied to one symbol, so every query returns the same set.
#[derive(Debug, Clone, Default)]
pub struct LspLocationsProvider {
    locations: Vec<FileLocation>,
}

impl LspLocationsProvider {
    pub fn new(locations: Vec<FileLocation>) -> Self {
        Self { locations }
    }

    pub fn from_lsp(locations: &[lsp_types::Location]) -> Self {
        Self::new(locations.iter().map(FileLocation::from).collect())
    }

    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let locations: Vec<lsp_types::Location> = serde_json::from_str(json)?;
        Ok(Self::from_lsp(&locations))
    }

    pub async fn load(path: &Path) -> Result<Self, ReferenceError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ReferenceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Location count per file
    pub fn files(&self) -> BTreeMap<&Path, usize> {
        let mut files = BTreeMap::new();
        for location in &self.locations {
            *files.entry(location.file_path.as_path()).or_insert(0) += 1;
        }
        files
    }
}

#[async_trait]
impl ReferenceProvider for LspLocationsProvider {
    async fn find_references(
        &self,
        file: &Path,
        position: Position,
    ) -> Result<Vec<FileLocation>, ReferenceError> {
        debug!(
            file = %file.display(),
            line = position.line,
            column = position.column,
            count = self.locations.len(),
            "Serving exported references"
        );
        Ok(self.locations.clone())
    }
}
