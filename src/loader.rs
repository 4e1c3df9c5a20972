//! Template loaders - where include files are read from

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem collaborator used to resolve and read included templates.
pub trait TemplateLoader: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads templates from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl TemplateLoader for FsLoader {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// In-memory template set keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl TemplateLoader for MemoryLoader {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not loaded", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader_directories() {
        let loader = MemoryLoader::new().with_file("/t/a/b.blade", "x");
        assert!(loader.is_file(Path::new("/t/a/b.blade")));
        assert!(loader.is_dir(Path::new("/t/a")));
        assert!(loader.is_dir(Path::new("/t")));
        assert!(!loader.is_dir(Path::new("/t/a/b.blade")));
        assert!(!loader.is_file(Path::new("/t/a")));
        assert_eq!(loader.read(Path::new("/t/a/b.blade")).unwrap(), "x");
        assert!(loader.read(Path::new("/t/zzz")).is_err());
    }
}
