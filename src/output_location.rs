//! Output location resolution
//!
//! Splits a raw output target into a directory and a file name. When the target is a
//! bare directory (or missing) the file name comes from a [`TokenSource`] so default
//! artifacts never collide. All randomness lives behind that trait.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Source of unique file-name tokens
pub trait TokenSource: Send + Sync {
    fn next_token(&self) -> String;
}

/// Random tokens from UUID v4 in simple (hyphen-less) form
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn next_token(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLocation {
    pub dir: PathBuf,
    pub file: String,
}

impl OutputLocation {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

fn looks_like_directory(raw: &str) -> bool {
    raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR)
}

pub fn resolve_output(
    raw: Option<&str>,
    workspace: &Path,
    tokens: &dyn TokenSource,
) -> OutputLocation {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty());

    match raw {
        Some(raw) if !looks_like_directory(raw) && Path::new(raw).extension().is_some() => {
            let path = Path::new(raw);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| tokens.next_token());
            OutputLocation { dir, file }
        }
        Some(raw) => OutputLocation {
            dir: PathBuf::from(raw),
            file: tokens.next_token(),
        },
        None => OutputLocation {
            dir: workspace.to_path_buf(),
            file: tokens.next_token(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTokens(AtomicUsize);

    impl TokenSource for CountingTokens {
        fn next_token(&self) -> String {
            format!("token{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[test]
    fn test_file_target_is_split() {
        let tokens = CountingTokens(AtomicUsize::new(0));
        let loc = resolve_output(Some("dist/js/app.min.js"), Path::new("/tmp/ws"), &tokens);
        assert_eq!(loc.dir, PathBuf::from("dist/js"));
        assert_eq!(loc.file, "app.min.js");
        assert_eq!(loc.path(), PathBuf::from("dist/js/app.min.js"));
    }

    #[test]
    fn test_bare_file_name_goes_to_current_dir() {
        let tokens = CountingTokens(AtomicUsize::new(0));
        let loc = resolve_output(Some("app.css"), Path::new("/tmp/ws"), &tokens);
        assert_eq!(loc.dir, PathBuf::from("."));
        assert_eq!(loc.file, "app.css");
    }

    #[test]
    fn test_directory_target_gets_token() {
        let tokens = CountingTokens(AtomicUsize::new(0));
        let loc = resolve_output(Some("dist/"), Path::new("/tmp/ws"), &tokens);
        assert_eq!(loc.dir, PathBuf::from("dist/"));
        assert_eq!(loc.file, "token0");

        let loc = resolve_output(Some("dist/assets"), Path::new("/tmp/ws"), &tokens);
        assert_eq!(loc.dir, PathBuf::from("dist/assets"));
        assert_eq!(loc.file, "token1");
    }

    #[test]
    fn test_missing_target_falls_back_to_workspace() {
        let tokens = UuidTokenSource;
        let workspace = Path::new("/tmp/ws");

        let first = resolve_output(None, workspace, &tokens);
        let second = resolve_output(Some("  "), workspace, &tokens);

        assert_eq!(first.dir, workspace);
        assert_eq!(second.dir, workspace);
        assert!(!first.file.is_empty());
        assert!(!second.file.is_empty());
        assert_ne!(first.file, second.file);
    }
}
