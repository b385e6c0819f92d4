//! Generator contract and orchestration
//!
//! A generator is a unit that, given the shared context, decides whether
//! it applies and produces zero or more files through the template engine
//! and file writer. The registry holds generators grouped by category,
//! fixes category execution order, and runs them against one context,
//! collecting successes, failures, and skips.

pub mod registry;

mod ci_workflows;
mod deploy_descriptor;
mod docker_compose;
mod domain_config;
mod gitignore;
mod middleware;
mod package_manifest;
mod readme;
mod scripts;
mod smoke_test;
mod static_site;
mod worker_entry;

#[cfg(test)]
mod tests;

pub use ci_workflows::CiWorkflowGenerator;
pub use deploy_descriptor::{DeployDescriptorGenerator, DESCRIPTOR_FILE};
pub use docker_compose::DockerComposeGenerator;
pub use domain_config::DomainConfigGenerator;
pub use gitignore::GitignoreGenerator;
pub use middleware::MiddlewareGenerator;
pub use package_manifest::PackageManifestGenerator;
pub use readme::ReadmeGenerator;
pub use registry::{ExecuteOptions, ExecutionResult, GeneratorRegistry, RunSummary};
pub use scripts::DeployScriptGenerator;
pub use smoke_test::SmokeTestGenerator;
pub use static_site::StaticSiteBundleGenerator;
pub use worker_entry::WorkerEntryGenerator;

use crate::context::GenerationContext;
use crate::output::FileWriter;
use crate::templates::TemplateEngine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Template(#[from] crate::templates::TemplateError),

    #[error(transparent)]
    Output(#[from] crate::output::OutputError),

    #[error("descriptor error: {0}")]
    Descriptor(#[from] crate::descriptor::DescriptorError),

    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Ordered artifact categories. Known categories execute in declaration
/// order; custom ones execute after all known categories, in
/// registration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CoreConfig,
    EnvironmentConfig,
    SourceCode,
    Scripts,
    Tests,
    Documentation,
    Ci,
    #[serde(rename = "service-type-specialization")]
    ServiceSpecialization,
    #[serde(untagged)]
    Custom(String),
}

impl Category {
    /// Rank in the fixed execution order.
    pub(crate) fn rank(&self) -> usize {
        match self {
            Category::CoreConfig => 0,
            Category::EnvironmentConfig => 1,
            Category::SourceCode => 2,
            Category::Scripts => 3,
            Category::Tests => 4,
            Category::Documentation => 5,
            Category::Ci => 6,
            Category::ServiceSpecialization => 7,
            Category::Custom(_) => usize::MAX,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::CoreConfig => f.write_str("core-config"),
            Category::EnvironmentConfig => f.write_str("environment-config"),
            Category::SourceCode => f.write_str("source-code"),
            Category::Scripts => f.write_str("scripts"),
            Category::Tests => f.write_str("tests"),
            Category::Documentation => f.write_str("documentation"),
            Category::Ci => f.write_str("ci"),
            Category::ServiceSpecialization => f.write_str("service-type-specialization"),
            Category::Custom(name) => f.write_str(name),
        }
    }
}

/// The per-run toolset generators write through: one template engine and
/// one file writer, both scoped to the run.
pub struct GeneratorTools {
    pub engine: TemplateEngine,
    pub writer: FileWriter,
}

impl GeneratorTools {
    pub fn new(engine: TemplateEngine, writer: FileWriter) -> Self {
        Self { engine, writer }
    }

    /// Default toolset for a context: embedded templates, writer rooted
    /// at the context's service path.
    pub fn for_context(context: &GenerationContext, options: crate::output::WriterOptions) -> Self {
        Self {
            engine: TemplateEngine::embedded(),
            writer: FileWriter::with_options(&context.service_path, options),
        }
    }
}

/// A unit of file production.
///
/// `should_generate` is a pure predicate; the registry consults it before
/// calling `generate`. `generate` must still be safe to call on an
/// inapplicable context (returning no files) so direct invocation outside
/// the registry keeps working.
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    fn should_generate(&self, _context: &GenerationContext) -> bool {
        true
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>>;
}
