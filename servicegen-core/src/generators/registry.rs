//! Generator registry and execution

use super::{Category, Generator, GeneratorTools};
use crate::context::GenerationContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid generator registration in category {category}: {reason}")]
    InvalidGenerator { category: String, reason: String },

    #[error("generator '{generator}' failed: {message}")]
    GeneratorFailed { generator: String, message: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// A successful generator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSuccess {
    pub name: String,
    pub category: Category,
    pub files: Vec<PathBuf>,
}

/// A failed generator run; the error message is captured, never the
/// panic machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorFailure {
    pub name: String,
    pub category: Category,
    pub message: String,
}

/// A generator whose `should_generate` declined the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSkip {
    pub name: String,
    pub category: Category,
}

/// Accumulated outcome of one registry run. Never mutated after the run
/// returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub succeeded: Vec<GeneratorSuccess>,
    pub failed: Vec<GeneratorFailure>,
    pub skipped: Vec<GeneratorSkip>,
    pub aborted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ExecutionResult {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            succeeded: self.succeeded.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
        }
    }

    /// Every file produced (or dry-run-reported) across generators.
    pub fn all_files(&self) -> Vec<&PathBuf> {
        self.succeeded.iter().flat_map(|s| s.files.iter()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.aborted
    }
}

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Abort the run at the first generator failure.
    pub stop_on_error: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self { stop_on_error: true }
    }
}

/// Holds generators grouped by category and runs them in fixed category
/// order against one context.
pub struct GeneratorRegistry {
    groups: Vec<(Category, Vec<Box<dyn Generator>>)>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Registry preloaded with the full default generator set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let groups: Vec<(Category, Vec<Box<dyn Generator>>)> = vec![
            (
                Category::CoreConfig,
                vec![
                    Box::new(super::PackageManifestGenerator::new()),
                    Box::new(super::DeployDescriptorGenerator::new()),
                    Box::new(super::GitignoreGenerator::new()),
                ],
            ),
            (Category::EnvironmentConfig, vec![Box::new(super::DomainConfigGenerator::new())]),
            (
                Category::SourceCode,
                vec![
                    Box::new(super::WorkerEntryGenerator::new()),
                    Box::new(super::MiddlewareGenerator::new()),
                ],
            ),
            (Category::Scripts, vec![Box::new(super::DeployScriptGenerator::new())]),
            (Category::Tests, vec![Box::new(super::SmokeTestGenerator::new())]),
            (Category::Documentation, vec![Box::new(super::ReadmeGenerator::new())]),
            (
                Category::Ci,
                vec![
                    Box::new(super::CiWorkflowGenerator::new()),
                    Box::new(super::DockerComposeGenerator::new()),
                ],
            ),
            (
                Category::ServiceSpecialization,
                vec![Box::new(super::StaticSiteBundleGenerator::new())],
            ),
        ];
        for (category, generators) in groups {
            if let Err(e) = registry.register(category, generators) {
                unreachable!("default generator set must register: {e}");
            }
        }
        registry
    }

    /// Validate and append `generators` to `category`. Multiple
    /// registrations to the same category accumulate.
    pub fn register(
        &mut self,
        category: Category,
        generators: Vec<Box<dyn Generator>>,
    ) -> Result<()> {
        for generator in &generators {
            if generator.name().trim().is_empty() {
                return Err(RegistryError::InvalidGenerator {
                    category: category.to_string(),
                    reason: "generator name must not be empty".to_string(),
                });
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for generator in self.generators_in(&category).chain(generators.iter().map(|g| &**g)) {
            if !seen.insert(generator.name()) {
                return Err(RegistryError::InvalidGenerator {
                    category: category.to_string(),
                    reason: format!("duplicate generator name '{}'", generator.name()),
                });
            }
        }

        match self.groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, existing)) => existing.extend(generators),
            None => self.groups.push((category, generators)),
        }
        Ok(())
    }

    fn generators_in<'a>(
        &'a self,
        category: &Category,
    ) -> Box<dyn Iterator<Item = &'a dyn Generator> + 'a> {
        match self.groups.iter().find(|(c, _)| c == category) {
            Some((_, generators)) => Box::new(generators.iter().map(|g| &**g)),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Total number of registered generators.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, g)| g.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every applicable generator against `context`.
    ///
    /// Categories execute in their fixed total order (custom categories
    /// after all known ones, in registration order); generators within a
    /// category run in registration order. The summary is logged whether
    /// the run completes or aborts.
    pub fn execute(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult> {
        let mut result = ExecutionResult::default();

        let mut ordered: Vec<&(Category, Vec<Box<dyn Generator>>)> = self.groups.iter().collect();
        ordered.sort_by_key(|(category, _)| category.rank());

        info!(
            "executing {} generators across {} categories for '{}'",
            self.len(),
            ordered.len(),
            context.core.service_name
        );

        for (category, generators) in ordered {
            debug!("category {category}");
            for generator in generators {
                if !generator.should_generate(context) {
                    debug!("skipping {} (not applicable)", generator.name());
                    result.skipped.push(GeneratorSkip {
                        name: generator.name().to_string(),
                        category: category.clone(),
                    });
                    continue;
                }

                match generator.generate(context, tools) {
                    Ok(files) => {
                        debug!("{} produced {} file(s)", generator.name(), files.len());
                        result.succeeded.push(GeneratorSuccess {
                            name: generator.name().to_string(),
                            category: category.clone(),
                            files,
                        });
                    }
                    Err(e) => {
                        error!("generator '{}' failed: {e}", generator.name());
                        result.failed.push(GeneratorFailure {
                            name: generator.name().to_string(),
                            category: category.clone(),
                            message: e.to_string(),
                        });
                        if options.stop_on_error {
                            result.aborted = true;
                            Self::log_summary(&result);
                            return Err(RegistryError::GeneratorFailed {
                                generator: generator.name().to_string(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Self::log_summary(&result);
        Ok(result)
    }

    fn log_summary(result: &ExecutionResult) {
        let summary = result.summary();
        if result.failed.is_empty() {
            info!(
                "generation summary: {} succeeded, {} failed, {} skipped",
                summary.succeeded, summary.failed, summary.skipped
            );
        } else {
            warn!(
                "generation summary: {} succeeded, {} failed, {} skipped{}",
                summary.succeeded,
                summary.failed,
                summary.skipped,
                if result.aborted { " (aborted)" } else { "" }
            );
            for failure in &result.failed {
                warn!("  {} [{}]: {}", failure.name, failure.category, failure.message);
            }
        }
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
