//! End-to-end generation scenarios over the default registry

use super::{ExecuteOptions, GeneratorRegistry, GeneratorTools, DESCRIPTOR_FILE};
use crate::context::GenerationContext;
use crate::output::{FileWriter, WriteOutcome, WriterOptions};
use crate::templates::TemplateEngine;
use crate::validation::ConsistencyValidator;
use std::path::Path;
use tempfile::TempDir;

fn context(service_type: &str, features: &[&str], temp_dir: &TempDir) -> GenerationContext {
    let json = serde_json::json!({
        "coreInputs": {
            "serviceName": "demo",
            "serviceType": service_type,
            "domainName": "demo.example.com",
            "cloudflareAccountId": "acct-1",
            "cloudflareZoneId": "zone-1"
        },
        "confirmedValues": {
            "description": "End-to-end scenario service",
            "features": features
        },
        "servicePath": temp_dir.path()
    })
    .to_string();
    GenerationContext::from_json(&json, None).unwrap()
}

fn tools(base: &Path, dry_run: bool, default_overwrite: bool) -> GeneratorTools {
    GeneratorTools::new(
        TemplateEngine::embedded(),
        FileWriter::with_options(base, WriterOptions { dry_run, default_overwrite }),
    )
}

#[test]
fn test_static_site_run_produces_expected_tree() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context("static-site", &[], &temp_dir);
    let registry = GeneratorRegistry::with_defaults();
    let mut run_tools = tools(temp_dir.path(), false, true);

    let result = registry.execute(&ctx, &mut run_tools, &ExecuteOptions::default()).unwrap();
    assert!(result.is_success());
    assert!(result.skipped.is_empty());

    for expected in [
        "package.json",
        "wrangler.toml",
        ".gitignore",
        "src/config/domains.js",
        "src/worker/index.js",
        "src/middleware/router.js",
        "src/middleware/errorHandler.js",
        "scripts/deploy.sh",
        "tests/smoke.test.js",
        "README.md",
        ".github/workflows/ci.yml",
        ".github/workflows/deploy.yml",
        "docker-compose.yml",
        "static-site-schema.json",
        "src/middleware/StaticSiteMiddleware.js",
    ] {
        assert!(temp_dir.path().join(expected).exists(), "missing {expected}");
    }
}

#[test]
fn test_generic_run_skips_static_site_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context("generic", &[], &temp_dir);
    let registry = GeneratorRegistry::with_defaults();
    let mut run_tools = tools(temp_dir.path(), false, true);

    let result = registry.execute(&ctx, &mut run_tools, &ExecuteOptions::default()).unwrap();
    assert!(result.is_success());
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].name, "static-site-bundle");
    assert!(!temp_dir.path().join("static-site-schema.json").exists());
    assert!(!temp_dir.path().join("src/middleware/StaticSiteMiddleware.js").exists());
}

#[test]
fn test_generated_tree_passes_consistency_validation() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context("static-site", &[], &temp_dir);
    let registry = GeneratorRegistry::with_defaults();
    let mut run_tools = tools(temp_dir.path(), false, true);
    registry.execute(&ctx, &mut run_tools, &ExecuteOptions::default()).unwrap();

    let manifest_path = temp_dir.path().join("capabilities.json");
    std::fs::write(
        &manifest_path,
        serde_json::json!({"d1": false, "kv": false, "r2": false, "environment": {}}).to_string(),
    )
    .unwrap();

    let report = ConsistencyValidator::new_default()
        .validate_service_config(&manifest_path, &temp_dir.path().join(DESCRIPTOR_FILE))
        .unwrap();
    assert!(report.valid);
    assert!(report.issues.is_empty());
}

#[test]
fn test_second_run_with_overwrite_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context("api", &["d1"], &temp_dir);
    let registry = GeneratorRegistry::with_defaults();

    let mut first = tools(temp_dir.path(), false, true);
    registry.execute(&ctx, &mut first, &ExecuteOptions::default()).unwrap();
    let package_first = std::fs::read_to_string(temp_dir.path().join("package.json")).unwrap();
    let descriptor_first = std::fs::read_to_string(temp_dir.path().join("wrangler.toml")).unwrap();

    let mut second = tools(temp_dir.path(), false, true);
    registry.execute(&ctx, &mut second, &ExecuteOptions::default()).unwrap();
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("package.json")).unwrap(),
        package_first
    );
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("wrangler.toml")).unwrap(),
        descriptor_first
    );
}

#[test]
fn test_no_overwrite_run_skips_every_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context("generic", &[], &temp_dir);
    let registry = GeneratorRegistry::with_defaults();

    let mut first = tools(temp_dir.path(), false, true);
    registry.execute(&ctx, &mut first, &ExecuteOptions::default()).unwrap();
    std::fs::write(temp_dir.path().join("README.md"), "hand-edited\n").unwrap();

    let mut second = tools(temp_dir.path(), false, false);
    registry.execute(&ctx, &mut second, &ExecuteOptions::default()).unwrap();

    assert!(
        second
            .writer
            .history()
            .iter()
            .all(|record| record.outcome == WriteOutcome::SkippedExisting)
    );
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("README.md")).unwrap(),
        "hand-edited\n"
    );
}

#[test]
fn test_dry_run_reports_paths_without_writing() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context("static-site", &["d1", "kv"], &temp_dir);
    let registry = GeneratorRegistry::with_defaults();
    let mut run_tools = tools(temp_dir.path(), true, true);

    let result = registry.execute(&ctx, &mut run_tools, &ExecuteOptions::default()).unwrap();
    assert!(result.is_success());
    assert!(!result.all_files().is_empty());

    // The intended write list is fully reported, yet nothing exists.
    for record in run_tools.writer.history() {
        assert_eq!(record.outcome, WriteOutcome::DryRun);
        assert!(!record.path.exists(), "{} must not exist", record.path.display());
    }
    let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
    assert!(entries.is_empty(), "service path must stay untouched");
}
