//! File system abstraction layer
//!
//! Provides trait-based abstractions for file system operations so document
//! loading and workspace search can run against an in-memory tree in tests.

use std::path::Path;

// ============================================================================
// File System Trait
// ============================================================================

/// Trait for file system operations
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemTrait: Send + Sync {
    /// Read file contents as bytes
    fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;
}

// ============================================================================
// Real File System Implementation
// ============================================================================

/// Real file system implementation using std::fs
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystemTrait for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(path)
    }
}

// ============================================================================
// Test File System Implementation
// ============================================================================


#[cfg(test)]
pub use test_filesystem::TestFileSystem;

// ============================================================================
// Tests
// ============================================================================
