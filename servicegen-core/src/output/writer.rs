//! Policy-aware file writer with per-instance write history

use super::{OutputError, PathResolver, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// How a single write attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Written,
    SkippedExisting,
    DryRun,
}

/// One entry in the writer's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenFileRecord {
    pub path: PathBuf,
    pub outcome: WriteOutcome,
    pub recorded_at: DateTime<Utc>,
}

/// Returned from every `write_file` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub written: bool,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub dry_run: bool,
    pub default_overwrite: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self { dry_run: false, default_overwrite: true }
    }
}

/// Counts exposed for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterStats {
    pub written: usize,
    pub skipped_existing: usize,
    pub dry_run: usize,
    pub base_path: Option<PathBuf>,
}

/// Materializes rendered content under a base directory.
///
/// Every write resolves its target through the [`PathResolver`] first, so
/// a traversal attempt fails before any directory is created. In dry-run
/// mode the writer records history but never touches disk.
pub struct FileWriter {
    resolver: PathResolver,
    options: WriterOptions,
    history: Vec<WrittenFileRecord>,
}

impl FileWriter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_options(base, WriterOptions::default())
    }

    pub fn with_options(base: impl Into<PathBuf>, options: WriterOptions) -> Self {
        Self { resolver: PathResolver::new(base), options, history: Vec::new() }
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Write `content` to `relative` using the default overwrite policy.
    pub fn write_file(&mut self, relative: impl AsRef<Path>, content: &str) -> Result<WriteReceipt> {
        self.write_file_with(relative, content, self.options.default_overwrite)
    }

    /// Write `content` to `relative`, skipping when the target exists and
    /// `overwrite` is false.
    pub fn write_file_with(
        &mut self,
        relative: impl AsRef<Path>,
        content: &str,
        overwrite: bool,
    ) -> Result<WriteReceipt> {
        let target = self.resolver.validate(relative.as_ref())?;

        if !overwrite && target.exists() {
            debug!("skipping existing file {}", target.display());
            self.record(&target, WriteOutcome::SkippedExisting);
            return Ok(WriteReceipt {
                written: false,
                path: target,
                reason: Some("File exists".to_string()),
                dry_run: self.options.dry_run,
            });
        }

        if self.options.dry_run {
            trace!("dry-run write {}", target.display());
            self.record(&target, WriteOutcome::DryRun);
            return Ok(WriteReceipt { written: true, path: target, reason: None, dry_run: true });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| OutputError::Io { path: parent.to_path_buf(), source })?;
        }
        fs::write(&target, content)
            .map_err(|source| OutputError::Io { path: target.clone(), source })?;

        trace!("wrote {}", target.display());
        self.record(&target, WriteOutcome::Written);
        Ok(WriteReceipt { written: true, path: target, reason: None, dry_run: false })
    }

    /// Create `relative` (and parents) as a directory. No-op in dry-run.
    pub fn ensure_directory(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let target = self.resolver.validate(relative.as_ref())?;
        if !self.options.dry_run {
            fs::create_dir_all(&target)
                .map_err(|source| OutputError::Io { path: target.clone(), source })?;
        }
        Ok(target)
    }

    /// Whether `relative` exists on the real filesystem. Dry-run-tracked
    /// paths report false, since nothing was actually written.
    pub fn file_exists(&self, relative: impl AsRef<Path>) -> bool {
        self.resolver
            .validate(relative.as_ref())
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Delete `relative` if present. Returns whether a deletion happened
    /// (or would have, in dry-run).
    pub fn delete_file(&mut self, relative: impl AsRef<Path>) -> Result<bool> {
        let target = self.resolver.validate(relative.as_ref())?;
        if !target.exists() {
            return Ok(false);
        }
        if self.options.dry_run {
            debug!("dry-run delete {}", target.display());
            return Ok(true);
        }
        fs::remove_file(&target)
            .map_err(|source| OutputError::Io { path: target.clone(), source })?;
        Ok(true)
    }

    pub fn history(&self) -> &[WrittenFileRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn stats(&self) -> WriterStats {
        let mut stats = WriterStats {
            written: 0,
            skipped_existing: 0,
            dry_run: 0,
            base_path: self.resolver.base().map(Path::to_path_buf),
        };
        for record in &self.history {
            match record.outcome {
                WriteOutcome::Written => stats.written += 1,
                WriteOutcome::SkippedExisting => stats.skipped_existing += 1,
                WriteOutcome::DryRun => stats.dry_run += 1,
            }
        }
        stats
    }

    fn record(&mut self, path: &Path, outcome: WriteOutcome) {
        self.history.push(WrittenFileRecord {
            path: path.to_path_buf(),
            outcome,
            recorded_at: Utc::now(),
        });
    }
}
