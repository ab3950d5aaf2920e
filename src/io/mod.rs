//! I/O layer - documents and workspace access
//!
//! - **Text source**: read-only document access with line and position lookup
//! - **File system**: byte-level reads, swappable for an in-memory double
//! - **File search**: glob-filtered, capped enumeration of workspace files
//!
//! Nothing above this layer touches the disk directly.

pub mod file_search;
pub mod file_system;
pub mod text_source;

pub use file_search::{FileSearch, FileSearchError, GlobFilter, MemoryFileSearch, WorkspaceFileSearch};
pub use file_system::{FileSystemTrait, RealFileSystem};
pub use text_source::{Selection, TextDocument, TextSource, TextSourceError};
