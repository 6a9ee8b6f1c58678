//! Where source text comes from.
//!
//! The driver reads files through a [`SourceProvider`] so runs can be fed
//! from disk or, in tests, from memory.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

pub trait SourceProvider {
    /// Read the source text stored at `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;
}

/// Reads files from disk. Bytes that are not valid UTF-8 (legacy Latin-1
/// sources are common) are replaced rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let bytes = std::fs::read(path)?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }
}

/// Maps paths to source text without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files
            .insert(Self::normalize_path(path.as_ref()), source.into());
    }

    /// Resolve `.` and `..` components lexically.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    components.pop();
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl From<HashMap<PathBuf, String>> for InMemoryProvider {
    fn from(files: HashMap<PathBuf, String>) -> Self {
        let mut provider = Self::new();
        for (path, source) in files {
            provider.insert(path, source);
        }
        provider
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("/src/app/../lib/./User.php");
        assert_eq!(
            InMemoryProvider::normalize_path(p),
            PathBuf::from("/src/lib/User.php")
        );
    }

    #[test]
    fn in_memory_lookup_uses_normalized_paths() {
        let provider = InMemoryProvider::new().with_file("src/./A.php", "<?php class A {}");
        let text = provider.read_source(Path::new("src/x/../A.php")).unwrap();
        assert_eq!(text, "<?php class A {}");
    }

    #[test]
    fn in_memory_missing_file_is_not_found() {
        let err = InMemoryProvider::new()
            .read_source(Path::new("nope.php"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn filesystem_provider_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.php");
        std::fs::write(&path, b"<?php // caf\xe9\n").unwrap();
        let text = FileSystemProvider.read_source(&path).unwrap();
        assert!(text.starts_with("<?php // caf"));
        assert!(text.contains('\u{FFFD}'));
    }
}
