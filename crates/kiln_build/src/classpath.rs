//! Layered classpath used to resolve resources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An ordered list of classpath entries, optionally layered over a parent.
///
/// Entries of this layer are searched before the parent's. A directory entry
/// resolves a resource by joining the resource path onto it; a file entry
/// resolves a resource equal to its own file name.
#[derive(Debug, Clone, Default)]
pub struct ClasspathContext {
    entries: Vec<PathBuf>,
    parent: Option<Arc<ClasspathContext>>,
}

impl ClasspathContext {
    /// Creates a root context with `entries`.
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self {
            entries,
            parent: None,
        }
    }

    /// Creates a context searching `entries` first, then `parent`.
    pub fn layered(entries: Vec<PathBuf>, parent: Arc<ClasspathContext>) -> Self {
        Self {
            entries,
            parent: Some(parent),
        }
    }

    /// All entries in search order.
    pub fn entries(&self) -> Vec<&Path> {
        let mut all: Vec<&Path> = self.entries.iter().map(PathBuf::as_path).collect();
        if let Some(parent) = &self.parent {
            all.extend(parent.entries());
        }
        all
    }

    /// Resolves `resource` (a `/`-separated relative path) to an existing file.
    pub fn resolve(&self, resource: &str) -> Option<PathBuf> {
        let relative = resource.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        for entry in &self.entries {
            if entry.is_dir() {
                let candidate = entry.join(relative);
                if candidate.is_file() {
                    return Some(candidate);
                }
            } else if entry.is_file() && entry.file_name().is_some_and(|n| n == relative) {
                return Some(entry.clone());
            }
        }
        self.parent.as_ref().and_then(|p| p.resolve(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_in_directory_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("util")).unwrap();
        std::fs::write(dir.path().join("util/strings.txt"), "").unwrap();

        let cp = ClasspathContext::new(vec![dir.path().to_path_buf()]);
        assert_eq!(
            cp.resolve("util/strings.txt"),
            Some(dir.path().join("util/strings.txt"))
        );
        assert!(cp.resolve("util/missing.txt").is_none());
        assert!(cp.resolve("").is_none());
    }

    #[test]
    fn resolves_file_entry_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("runtime.jar");
        std::fs::write(&jar, "").unwrap();

        let cp = ClasspathContext::new(vec![jar.clone()]);
        assert_eq!(cp.resolve("runtime.jar"), Some(jar));
    }

    #[test]
    fn own_entries_shadow_parent() {
        let parent_dir = tempfile::tempdir().unwrap();
        let child_dir = tempfile::tempdir().unwrap();
        for d in [&parent_dir, &child_dir] {
            std::fs::write(d.path().join("shared.txt"), "").unwrap();
        }
        std::fs::write(parent_dir.path().join("base.txt"), "").unwrap();

        let parent = Arc::new(ClasspathContext::new(vec![parent_dir.path().to_path_buf()]));
        let cp = ClasspathContext::layered(vec![child_dir.path().to_path_buf()], parent);

        assert_eq!(cp.resolve("shared.txt"), Some(child_dir.path().join("shared.txt")));
        assert_eq!(cp.resolve("base.txt"), Some(parent_dir.path().join("base.txt")));
        assert_eq!(cp.entries().len(), 2);
    }
}
