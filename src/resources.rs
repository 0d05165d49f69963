//! Resource copying
//!
//! Copies local files (and whole directories) into a destination directory and
//! downloads `http://` / `https://` sources. Destination file names are the source
//! file names; directory sources keep their inner layout.
//!
//! Everything is first copied into a hidden staging directory inside the
//! destination and only moved into place once every source succeeded, so a failed
//! copy never leaves part of the set behind.

use crate::error::{BuildError, BuildResult};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const FALLBACK_NAME: &str = "resource";

#[derive(Debug, Clone)]
pub struct ResourceCopier {
    client: reqwest::Client,
}

impl Default for ResourceCopier {
    fn default() -> Self {
        Self::new()
    }
}

fn is_remote(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// File name for a downloaded URL: its last path segment, percent-decoded
fn remote_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| {
            let segment = url.path_segments()?.last()?.to_string();
            let decoded = urlencoding::decode(&segment).ok()?;
            // an encoded separator must not reach outside the destination
            let name = Path::new(&*decoded).file_name()?.to_string_lossy().into_owned();
            Some(name)
        })
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

impl ResourceCopier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Copy every source into `dest_dir` and return the written paths.
    ///
    /// Either all sources land in `dest_dir` or none do: the first failure aborts
    /// the copy and discards what was staged so far. `on_copied` sees each final
    /// path once the whole set is in place.
    pub async fn copy<F>(
        &self,
        sources: &[PathBuf],
        dest_dir: &Path,
        mut on_copied: F,
    ) -> BuildResult<Vec<PathBuf>>
    where
        F: FnMut(&Path) + Send,
    {
        let staging = dest_dir.join(format!(".resources.{}.partial", Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| BuildError::workspace(&staging, e))?;

        let result = match self.stage(sources, &staging).await {
            Ok(staged) => commit(&staging, dest_dir, &staged).await,
            Err(e) => Err(e),
        };
        if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
            warn!(staging = %staging.display(), error = %e, "Failed to remove resource staging");
        }
        let written = result?;

        for path in &written {
            on_copied(path);
        }
        debug!(
            dest = %dest_dir.display(),
            files = written.len(),
            "Copied resources"
        );
        Ok(written)
    }

    /// Copy all sources under `staging`, returning paths relative to it
    async fn stage(&self, sources: &[PathBuf], staging: &Path) -> BuildResult<Vec<PathBuf>> {
        let mut staged = Vec::new();
        for source in sources {
            let raw = source.to_string_lossy();
            if is_remote(&raw) {
                staged.push(self.download(&raw, staging).await?);
            } else if tokio::fs::metadata(source)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
            {
                staged.extend(copy_dir(source, staging).await?);
            } else {
                staged.push(copy_file(source, staging).await?);
            }
        }
        Ok(staged)
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> BuildResult<PathBuf> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BuildError::resource(url, e))?;

        if !response.status().is_success() {
            return Err(BuildError::resource(
                url,
                format!("download failed with HTTP {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BuildError::resource(url, e))?;

        let name = PathBuf::from(remote_file_name(url));
        tokio::fs::write(dest_dir.join(&name), &bytes)
            .await
            .map_err(|e| BuildError::resource(url, e))?;

        debug!(url, name = %name.display(), bytes = bytes.len(), "Downloaded resource");
        Ok(name)
    }
}

/// Move staged files into `dest_dir`. A failed move takes back the files already
/// moved.
async fn commit(staging: &Path, dest_dir: &Path, staged: &[PathBuf]) -> BuildResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(staged.len());
    // a repeated name was overwritten in staging by the later source
    let mut seen = HashSet::new();
    for relative in staged.iter().filter(|relative| seen.insert(*relative)) {
        let dest = dest_dir.join(relative);
        if let Err(e) = place(&staging.join(relative), &dest).await {
            for moved in &written {
                let _ = tokio::fs::remove_file(moved).await;
            }
            return Err(e);
        }
        written.push(dest);
    }
    Ok(written)
}

async fn place(staged: &Path, dest: &Path) -> BuildResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::workspace(parent, e))?;
    }
    tokio::fs::rename(staged, dest)
        .await
        .map_err(|e| BuildError::workspace(dest, e))
}

async fn copy_file(source: &Path, staging: &Path) -> BuildResult<PathBuf> {
    let name = source
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| BuildError::resource(source.display().to_string(), "no file name"))?;

    tokio::fs::copy(source, staging.join(&name))
        .await
        .map_err(|e| BuildError::resource(source.display().to_string(), e))?;
    Ok(name)
}

async fn copy_dir(source: &Path, staging: &Path) -> BuildResult<Vec<PathBuf>> {
    let root_name = source.file_name().map(PathBuf::from).unwrap_or_default();
    let mut files = Vec::new();

    for entry in WalkBuilder::new(source).standard_filters(false).build() {
        let entry = entry.map_err(|e| BuildError::resource(source.display().to_string(), e))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let relative = root_name.join(file.strip_prefix(source).unwrap_or(&file));
        let dest = staging.join(&relative);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::workspace(parent, e))?;
        }
        tokio::fs::copy(&file, &dest)
            .await
            .map_err(|e| BuildError::resource(file.display().to_string(), e))?;
        copied.push(relative);
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remote_file_name() {
        assert_eq!(
            remote_file_name("https://cdn.example.com/img/logo.png?v=3"),
            "logo.png"
        );
        assert_eq!(
            remote_file_name("https://cdn.example.com/fonts/Open%20Sans.woff#latin"),
            "Open Sans.woff"
        );
        assert_eq!(remote_file_name("https://cdn.example.com/a%2Fb.txt"), "b.txt");
        assert_eq!(remote_file_name("https://cdn.example.com/x/%2E%2E"), FALLBACK_NAME);
        assert_eq!(remote_file_name("http://example.com/"), FALLBACK_NAME);
        assert_eq!(remote_file_name("http://example.com"), FALLBACK_NAME);
        assert!(is_remote("https://example.com/a.css"));
        assert!(is_remote("HTTP://example.com/a.css"));
        assert!(!is_remote("ftp://example.com/a.css"));
        assert!(!is_remote("assets/a.css"));
    }

    #[tokio::test]
    async fn test_copies_files_and_directories() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let out = dest.path().join("static");

        std::fs::write(src.path().join("logo.png"), b"png").unwrap();
        std::fs::create_dir_all(src.path().join("fonts/woff")).unwrap();
        std::fs::write(src.path().join("fonts/woff/a.woff"), b"font").unwrap();

        let mut seen = Vec::new();
        let written = ResourceCopier::new()
            .copy(
                &[src.path().join("logo.png"), src.path().join("fonts")],
                &out,
                |path| seen.push(path.to_path_buf()),
            )
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![out.join("logo.png"), out.join("fonts/woff/a.woff")]
        );
        assert_eq!(seen, written);
        assert_eq!(std::fs::read(out.join("fonts/woff/a.woff")).unwrap(), b"font");
    }

    #[tokio::test]
    async fn test_missing_source_is_resource_error() {
        let dest = TempDir::new().unwrap();
        let err = ResourceCopier::new()
            .copy(&[PathBuf::from("/nonexistent/logo.png")], dest.path(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "resource");
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_destination_empty() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        std::fs::write(src.path().join("logo.png"), b"png").unwrap();
        std::fs::create_dir_all(src.path().join("fonts")).unwrap();
        std::fs::write(src.path().join("fonts/a.woff"), b"font").unwrap();

        let mut seen = Vec::new();
        let err = ResourceCopier::new()
            .copy(
                &[
                    src.path().join("logo.png"),
                    src.path().join("fonts"),
                    src.path().join("missing.png"),
                ],
                dest.path(),
                |path| seen.push(path.to_path_buf()),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "resource");
        assert!(seen.is_empty());
        assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
    }
}
