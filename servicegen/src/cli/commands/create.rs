//! Create command handler

use crate::cli::app::CreateArgs;
use anyhow::{Context, Result};
use servicegen_core::generators::{ExecuteOptions, GeneratorRegistry, GeneratorTools};
use servicegen_core::output::{FileWriter, WriterOptions};
use servicegen_core::templates::{TemplateConfig, TemplateEngine};
use servicegen_core::GenerationContext;
use tracing::info;

/// Handle the create command
pub fn execute(args: CreateArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.context)
        .with_context(|| format!("failed to read context file {}", args.context.display()))?;

    let fallback = match args.output {
        Some(path) => Some(absolutize(path)?),
        None => None,
    };
    let context = GenerationContext::from_json(&text, fallback)
        .context("context input is not usable")?;

    info!(
        "creating '{}' ({}) under {}",
        context.core.service_name,
        context.core.service_type,
        context.service_path.display()
    );

    let engine = TemplateEngine::new(TemplateConfig {
        templates_root: args.templates.clone(),
        partials_root: args.templates,
        cache_enabled: true,
    });
    let writer = FileWriter::with_options(
        &context.service_path,
        WriterOptions { dry_run: args.dry_run, default_overwrite: !args.no_overwrite },
    );
    let mut tools = GeneratorTools::new(engine, writer);

    let registry = GeneratorRegistry::with_defaults();
    let result = registry
        .execute(&context, &mut tools, &ExecuteOptions { stop_on_error: !args.keep_going })
        .context("generation run failed")?;

    let summary = result.summary();
    println!(
        "{} succeeded, {} failed, {} skipped",
        summary.succeeded, summary.failed, summary.skipped
    );
    let verb = if args.dry_run { "would write" } else { "wrote" };
    for path in result.all_files() {
        println!("  {verb} {}", path.display());
    }
    for failure in &result.failed {
        eprintln!("  failed {} [{}]: {}", failure.name, failure.category, failure.message);
    }

    if result.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} generator(s) failed", summary.failed)
    }
}

fn absolutize(path: std::path::PathBuf) -> Result<std::path::PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir().context("cannot resolve current directory")?.join(path))
    }
}
