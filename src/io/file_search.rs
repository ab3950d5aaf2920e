//! Workspace file enumeration
//!
//! [`FileSearch`] is the "list files matching a glob, then open them"
//! collaborator of the usage finder. [`WorkspaceFileSearch`] walks a directory
//! tree on disk; [`MemoryFileSearch`] serves documents a host already holds in
//! memory (and backs the tests).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::io::text_source::{TextDocument, TextSourceError};
use crate::language::Language;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FileSearchError {
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Search root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("File enumeration task failed: {0}")]
    Task(String),
}

// ============================================================================
// File Search Trait
// ============================================================================

/// Enumerate and open workspace files
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileSearch: Send + Sync {
    /// Files matching `include` and not matching `exclude` (empty = exclude
    /// nothing), in a stable order, at most `limit` of them
    async fn find_files(
        &self,
        include: &str,
        exclude: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, FileSearchError>;

    async fn open_document(&self, path: &Path) -> Result<TextDocument, TextSourceError>;
}

// ============================================================================
// Glob Filter
// ============================================================================

/// Compiled include/exclude pair matched against `/`-separated relative paths
#[derive(Debug, Clone)]
pub struct GlobFilter {
    include: GlobMatcher,
    exclude: Option<GlobMatcher>,
}

impl GlobFilter {
    pub fn new(include: &str, exclude: &str) -> Result<Self, FileSearchError> {
        let include = compile_glob(include)?;
        let exclude = match exclude.trim() {
            "" => None,
            pattern => Some(compile_glob(pattern)?),
        };
        Ok(Self { include, exclude })
    }

    pub fn is_match(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.is_excluded(relative)
    }

    pub fn is_excluded(&self, relative: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(relative))
    }
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher, FileSearchError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| FileSearchError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Relative path with forward slashes, the form globs are matched against
fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Disk Workspace
// ============================================================================

/// Walks a workspace root on disk in file-name order
#[derive(Debug, Clone)]
pub struct WorkspaceFileSearch {
    root: PathBuf,
    follow_symlinks: bool,
}

impl WorkspaceFileSearch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
        }
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(
        root: &Path,
        filter: &GlobFilter,
        follow_symlinks: bool,
        limit: usize,
    ) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if limit == 0 {
            return files;
        }

        let walker = WalkDir::new(root)
            .follow_links(follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // Prune excluded directories instead of descending into them
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !filter.is_excluded(&relative_slash_path(root, entry.path()))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to access directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_slash_path(root, entry.path());
            if filter.is_match(&relative) {
                files.push(entry.into_path());
                if files.len() >= limit {
                    break;
                }
            }
        }

        files
    }
}

#[async_trait]
impl FileSearch for WorkspaceFileSearch {
    async fn find_files(
        &self,
        include: &str,
        exclude: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, FileSearchError> {
        if !self.root.is_dir() {
            return Err(FileSearchError::RootNotFound {
                path: self.root.clone(),
            });
        }

        let filter = GlobFilter::new(include, exclude)?;
        let root = self.root.clone();
        let follow_symlinks = self.follow_symlinks;

        let files = tokio::task::spawn_blocking(move || {
            Self::walk(&root, &filter, follow_symlinks, limit)
        })
        .await
        .map_err(|e| FileSearchError::Task(e.to_string()))?;

        debug!(
            root = %self.root.display(),
            include,
            found = files.len(),
            "Enumerated workspace files"
        );
        Ok(files)
    }

    async fn open_document(&self, path: &Path) -> Result<TextDocument, TextSourceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TextSourceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(TextDocument::new(path, Language::from_path(path), content))
    }
}

// ============================================================================
// In-Memory Workspace
// ============================================================================

/// Documents held in memory, enumerated in path order
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSearch {
    root: PathBuf,
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFileSearch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileSearch for MemoryFileSearch {
    async fn find_files(
        &self,
        include: &str,
        exclude: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, FileSearchError> {
        let filter = GlobFilter::new(include, exclude)?;
        Ok(self
            .files
            .keys()
            .filter(|path| filter.is_match(&relative_slash_path(&self.root, path)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn open_document(&self, path: &Path) -> Result<TextDocument, TextSourceError> {
        match self.files.get(path) {
            Some(content) => Ok(TextDocument::new(
                path,
                Language::from_path(path),
                content.as_str(),
            )),
            None => Err(TextSourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::text_source::TextSource;

    const SOURCES: &str = "**/*.{ts,tsx,js,jsx,py,java}";

    #[test]
    fn test_glob_filter_include_and_exclude() {
        let filter = GlobFilter::new(SOURCES, "**/node_modules/**").unwrap();
        assert!(filter.is_match("src/app.ts"));
        assert!(filter.is_match("main.py"));
        assert!(!filter.is_match("README.md"));
        assert!(!filter.is_match("web/node_modules/lib/index.js"));
        assert!(filter.is_excluded("web/node_modules/lib/index.js"));
    }

    #[test]
    fn test_glob_filter_rejects_bad_pattern() {
        let err = GlobFilter::new("src/[", "").unwrap_err();
        assert!(matches!(err, FileSearchError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_workspace_search_walks_sorted_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/nested")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("src/b.ts"), "b").unwrap();
        std::fs::write(root.join("src/a.ts"), "a").unwrap();
        std::fs::write(root.join("src/nested/c.py"), "c").unwrap();
        std::fs::write(root.join("src/notes.txt"), "n").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();

        let search = WorkspaceFileSearch::new(root);
        let files = search
            .find_files(SOURCES, "**/node_modules", 100)
            .await
            .unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| relative_slash_path(root, p))
            .collect();
        assert_eq!(names, vec!["src/a.ts", "src/b.ts", "src/nested/c.py"]);

        let capped = search.find_files(SOURCES, "", 2).await.unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_workspace_search_missing_root() {
        let search = WorkspaceFileSearch::new("/definitely/does/not/exist");
        let err = search.find_files(SOURCES, "", 10).await.unwrap_err();
        assert!(matches!(err, FileSearchError::RootNotFound { .. }));
    }

    #[tokio::test]
    async fn test_workspace_open_document_infers_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Widget.jsx");
        std::fs::write(&path, "export const Widget = () => null;\n").unwrap();

        let doc = WorkspaceFileSearch::new(dir.path())
            .open_document(&path)
            .await
            .unwrap();
        assert_eq!(doc.language(), &Language::JavaScriptReact);
        assert_eq!(doc.line_at(0), Some("export const Widget = () => null;"));
    }

    #[tokio::test]
    async fn test_memory_search_filters_in_path_order() {
        let search = MemoryFileSearch::new("/ws")
            .with_file("/ws/z.ts", "z")
            .with_file("/ws/a.java", "a")
            .with_file("/ws/doc.md", "d");

        let files = search.find_files(SOURCES, "", 10).await.unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("/ws/a.java"), PathBuf::from("/ws/z.ts")]
        );

        let missing = search.open_document(Path::new("/ws/none.ts")).await;
        assert!(missing.is_err());
    }
}
