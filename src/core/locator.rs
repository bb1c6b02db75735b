//! Expands configured source locations into concrete source files.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CalltrailError, Result};
use super::module_index::IndexDiagnostic;

/// Resolves files, directories and glob patterns to source paths
pub struct SourceLocator {
    extensions: Vec<String>,
}

impl SourceLocator {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Paths for every location, in location order, each location sorted.
    /// Locations that match nothing or cannot be walked become diagnostics.
    pub fn locate(&self, locations: &[String]) -> (Vec<PathBuf>, Vec<IndexDiagnostic>) {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        let mut diagnostics = Vec::new();

        for location in locations {
            match self.locate_one(location) {
                Ok(found) => {
                    if found.is_empty() {
                        debug!("Source location {} matched no files", location);
                    }
                    for path in found {
                        if seen.insert(path.clone()) {
                            paths.push(path);
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping source location {}: {}", location, e);
                    diagnostics.push(IndexDiagnostic::new(location, e.to_string()));
                }
            }
        }

        (paths, diagnostics)
    }

    fn locate_one(&self, location: &str) -> Result<Vec<PathBuf>> {
        let path = Path::new(location);
        let mut found = if path.is_file() {
            vec![path.to_path_buf()]
        } else if path.is_dir() {
            self.walk_directory(path)?
        } else if is_glob(location) {
            self.expand_glob(location)?
        } else {
            return Err(CalltrailError::FileSystem(format!("{} does not exist", location)));
        };

        found.sort();
        Ok(found)
    }

    /// Walk a directory, respecting .gitignore, keeping parseable files
    fn walk_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let walker = WalkBuilder::new(dir)
            .hidden(false)
            .git_ignore(true)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| CalltrailError::FileSystem(e.to_string()))?;
            let path = entry.path();
            if path.is_file() && self.has_source_extension(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    /// Expand a glob by walking its literal prefix directory
    fn expand_glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
        let matcher = compile_glob(pattern)?;
        let base = literal_prefix(pattern);
        let walk_root = if base.as_os_str().is_empty() { PathBuf::from(".") } else { base.clone() };

        if !walk_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&walk_root).follow_links(false) {
            let entry = entry.map_err(|e| CalltrailError::FileSystem(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Match against the path as it would be written relative to the pattern
            let candidate = if base.as_os_str().is_empty() {
                entry.path().strip_prefix(".").unwrap_or(entry.path()).to_path_buf()
            } else {
                entry.path().to_path_buf()
            };
            if matcher.is_match(&candidate) {
                files.push(candidate);
            }
        }
        Ok(files)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }
}

fn is_glob(location: &str) -> bool {
    location.contains(['*', '?', '[', '{'])
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| CalltrailError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Leading path components that contain no glob syntax
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    let mut components = Path::new(pattern).components().peekable();
    while let Some(component) = components.next() {
        // The final component is the file pattern itself
        if components.peek().is_none() {
            break;
        }
        match component {
            Component::Normal(part) if is_glob(&part.to_string_lossy()) => break,
            Component::CurDir => continue,
            other => prefix.push(other.as_os_str()),
        }
    }
    prefix
}
