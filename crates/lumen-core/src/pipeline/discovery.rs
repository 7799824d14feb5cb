//! Finding image files under the protected and candidate roots.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files by extension.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// A file found by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover all supported image files at a path.
    ///
    /// A file is returned if its extension is supported; a directory is
    /// walked recursively. Paths are canonical, so a file reached through a
    /// symlink or a `..` spelling is reported once under its real location.
    /// Results are sorted by path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        let root = match std::fs::canonicalize(path) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Cannot resolve {}: {}", path.display(), e);
                return vec![];
            }
        };

        if root.is_file() {
            if self.is_supported(&root) {
                if let Ok(meta) = std::fs::metadata(&root) {
                    return vec![DiscoveredFile {
                        path: root,
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        let unique: BTreeMap<PathBuf, u64> = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file() && self.is_supported(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                let path = std::fs::canonicalize(entry.path()).ok()?;
                Some((path, size))
            })
            .collect();

        unique
            .into_iter()
            .map(|(path, size)| DiscoveredFile { path, size })
            .collect()
    }

    /// Discover across several roots, dropping files reached from more than one.
    pub fn discover_all(&self, roots: &[PathBuf]) -> Vec<DiscoveredFile> {
        let mut unique = BTreeMap::new();
        for root in roots {
            if !root.exists() {
                tracing::warn!("Folder does not exist: {}", root.display());
                continue;
            }
            for file in self.discover(root) {
                unique.entry(file.path.clone()).or_insert(file);
            }
        }
        unique.into_values().collect()
    }

    /// Check if a file has a supported extension (case-insensitive).
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Total size of a set of discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
