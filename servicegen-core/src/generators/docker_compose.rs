//! Containerization descriptor generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

/// Emits `docker-compose.yml` for local development.
#[derive(Debug, Default)]
pub struct DockerComposeGenerator;

impl DockerComposeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for DockerComposeGenerator {
    fn name(&self) -> &str {
        "docker-compose"
    }

    fn category(&self) -> Category {
        Category::Ci
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::DOCKER_COMPOSE)?;
        let text = tools.engine.render(&template, &context.vars(), RenderMode::Strict)?;
        let receipt = tools.writer.write_file("docker-compose.yml", &text)?;
        Ok(vec![receipt.path])
    }
}
