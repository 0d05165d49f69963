use super::{FileMetadata, FileSystem, FileType};
use anyhow::{Context, Result};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::fs;
use std::path::{Path, PathBuf};

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).context(format!("Failed to get metadata for {:?}", path))?;

        let file_type = if meta.is_file() {
            FileType::File
        } else if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::Symlink
        };

        Ok(FileMetadata {
            size: meta.len(),
            file_type,
        })
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context(format!("Failed to create directory {:?}", path))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).context(format!("Failed to create directory {:?}", parent))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let staging = parent.join(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ));

        fs::write(&staging, contents).context(format!("Failed to write file {:?}", staging))?;
        if let Err(e) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(e).context(format!("Failed to move {:?} into place at {:?}", staging, path));
        }
        Ok(())
    }

    fn find_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut override_builder = OverrideBuilder::new(dir);
        override_builder
            .add(pattern)
            .context(format!("Invalid file pattern {:?}", pattern))?;
        let overrides = override_builder
            .build()
            .context(format!("Invalid file pattern {:?}", pattern))?;

        let mut found = Vec::new();
        for result in WalkBuilder::new(dir)
            .standard_filters(false)
            .overrides(overrides)
            .build()
        {
            let entry = result.context(format!("Failed to walk directory {:?}", dir))?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                found.push(entry.into_path());
            }
        }

        found.sort();
        Ok(found)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).context(format!("Failed to remove directory {:?}", path))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir(base.join("subdir")).unwrap();
        fs::File::create(base.join("app.js"))
            .unwrap()
            .write_all(b"hello world")
            .unwrap();
        fs::File::create(base.join("subdir/nested.js"))
            .unwrap()
            .write_all(b"nested content")
            .unwrap();
        fs::File::create(base.join("subdir/style.css"))
            .unwrap()
            .write_all(b"body {}")
            .unwrap();

        dir
    }

    #[test]
    fn test_metadata_distinguishes_files_and_directories() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        assert!(fs.metadata(&temp.path().join("subdir")).unwrap().is_dir());
        assert!(fs.metadata(&temp.path().join("app.js")).unwrap().is_file());
        assert!(fs.metadata(&temp.path().join("nonexistent")).is_err());
    }

    #[test]
    fn test_metadata() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let meta = fs.metadata(&temp.path().join("app.js")).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len(), 11);
    }

    #[test]
    fn test_read_to_string() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let content = fs.read_to_string(&temp.path().join("app.js")).unwrap();
        assert_eq!(content, "hello world");
        assert!(fs.read_to_string(&temp.path().join("missing.js")).is_err());
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();
        let target = temp.path().join("out/nested/app.min.js");

        fs.write_atomic(&target, "var a=1;").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "var a=1;");
        let leftovers: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_find_files_by_pattern() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let found = fs.find_files(temp.path(), "*.js").unwrap();
        assert_eq!(
            found,
            vec![temp.path().join("app.js"), temp.path().join("subdir/nested.js")]
        );
    }

    #[test]
    fn test_remove_dir_all_removes_tree_and_tolerates_missing() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();
        let subdir = temp.path().join("subdir");

        fs.remove_dir_all(&subdir).unwrap();
        assert!(!subdir.exists());
        assert!(temp.path().join("app.js").exists());

        fs.remove_dir_all(&subdir).unwrap();
    }
}
