//! Output path resolution and traversal defense

use super::{OutputError, Result};
use std::path::{Component, Path, PathBuf};

/// Resolves relative output paths against a base directory and rejects
/// any path that escapes it.
///
/// The base directory does not need to exist yet; normalization is
/// lexical so freshly scaffolded trees can be validated before a single
/// directory is created.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: Option<PathBuf>,
}

impl PathResolver {
    /// Create a resolver rooted at `base`. A relative base is anchored at
    /// the current working directory.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let base = if base.is_absolute() {
            base
        } else {
            std::env::current_dir().map(|cwd| cwd.join(&base)).unwrap_or(base)
        };
        Self { base: Some(normalize(&base)) }
    }

    /// Create a resolver with no base directory. Validation always
    /// passes. This is an escape hatch for root-less usage, not a
    /// security default.
    pub fn unrooted() -> Self {
        Self { base: None }
    }

    /// The configured base directory, if any.
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Join `segments` onto the base directory and lexically normalize
    /// the result. No traversal check is applied here; see [`Self::validate`].
    pub fn resolve<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.base.clone().unwrap_or_default();
        for segment in segments {
            path.push(segment.as_ref());
        }
        normalize(&path)
    }

    /// Resolve `relative` against the base and assert the normalized
    /// path is still inside it.
    pub fn validate(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let relative = relative.as_ref();
        let resolved = self.resolve([relative]);

        match &self.base {
            None => Ok(resolved),
            Some(base) => {
                if resolved.starts_with(base) {
                    Ok(resolved)
                } else {
                    Err(OutputError::PathTraversal {
                        attempted: relative.to_path_buf(),
                        base: base.clone(),
                    })
                }
            }
        }
    }
}

/// Lexical `.`/`..` resolution. Unlike `fs::canonicalize` this never
/// touches the filesystem, so it works for paths that do not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
