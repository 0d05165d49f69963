//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Metadata about a file
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub file_type: FileType,
}

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

impl FileMetadata {
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Abstraction over the file operations the classifier and dispatcher need
pub trait FileSystem: Send + Sync {
    /// Size and kind of the entry at `path`; errors when nothing is there
    fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create a directory and all of its parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write a file so that readers never observe a half-written result
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()>;

    /// Recursively list files under `dir` whose file name matches `pattern`
    /// (a glob such as `*.js`). Results are sorted.
    fn find_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Delete a directory tree. Succeeds when `path` is already gone.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata_is_file() {
        let meta = FileMetadata {
            size: 100,
            file_type: FileType::File,
        };
        assert!(meta.is_file());
        assert!(!meta.is_dir());
    }

    #[test]
    fn test_file_metadata_is_dir() {
        let meta = FileMetadata {
            size: 0,
            file_type: FileType::Directory,
        };
        assert!(meta.is_dir());
        assert!(!meta.is_file());
        assert!(meta.is_empty());
    }
}
