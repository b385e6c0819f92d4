//! Validate command handler

use crate::cli::app::ValidateArgs;
use anyhow::{Context, Result};
use servicegen_core::validation::{ConsistencyValidator, Severity};
use tracing::info;

/// Handle the validate command
pub fn execute(args: ValidateArgs) -> Result<()> {
    let manifest_path =
        args.manifest.unwrap_or_else(|| args.service_dir.join("capabilities.json"));
    let descriptor_path =
        args.descriptor.unwrap_or_else(|| args.service_dir.join("wrangler.toml"));

    let validator = ConsistencyValidator::new_default();

    if args.fix {
        let report = validator
            .auto_fix(&manifest_path, &descriptor_path)
            .context("auto-fix pass failed")?;
        if let Some(backup) = &report.backup_path {
            println!("descriptor backed up to {}", backup.display());
        }
        println!("applied {} fix(es), {} issue(s) remaining", report.fixed.len(), report.remaining.len());
        for issue in &report.remaining {
            print_issue(&issue.severity, &issue.message, issue.suggested_fix.as_deref());
        }
        return Ok(());
    }

    let report = validator
        .validate_service_config(&manifest_path, &descriptor_path)
        .context("validation pass failed")?;

    for issue in &report.issues {
        print_issue(&issue.severity, &issue.message, issue.suggested_fix.as_deref());
    }

    if report.valid {
        info!("descriptor is consistent with the capability manifest");
        println!("valid: no critical issues");
        Ok(())
    } else {
        anyhow::bail!("descriptor is inconsistent with the capability manifest")
    }
}

fn print_issue(severity: &Severity, message: &str, suggested_fix: Option<&str>) {
    let label = match severity {
        Severity::Error => "ERROR",
        Severity::Warning => "WARN",
        Severity::Info => "INFO",
    };
    println!("[{label}] {message}");
    if let Some(fix) = suggested_fix {
        println!("        fix: {fix}");
    }
}
