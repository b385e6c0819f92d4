//! Manifest/descriptor consistency checks and auto-fix

use super::{
    CapabilityManifest, IssueKind, ResourceFamily, Result, Severity, ValidationError,
    ValidationIssue,
};
use crate::descriptor::{
    D1Database, DeployDescriptor, DescriptorParser, KvNamespace, R2Bucket, TomlDescriptorParser,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one validation pass. Warnings and info-level issues never
/// flip validity; only error-severity issues do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Outcome of an auto-fix pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixReport {
    pub fixed: Vec<IssueKind>,
    pub remaining: Vec<ValidationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

/// Validates a capability manifest against a deployment descriptor.
///
/// The descriptor parsing strategy is injected at construction so tests
/// can substitute behavior without mutating shared state.
pub struct ConsistencyValidator {
    parser: Box<dyn DescriptorParser>,
}

impl ConsistencyValidator {
    pub fn new(parser: Box<dyn DescriptorParser>) -> Self {
        Self { parser }
    }

    /// Validator backed by the TOML parser.
    pub fn new_default() -> Self {
        Self::new(Box::new(TomlDescriptorParser))
    }

    /// Compare declared capabilities with actual bindings.
    pub fn validate_service_config(
        &self,
        manifest_path: &Path,
        descriptor_path: &Path,
    ) -> Result<ValidationReport> {
        let manifest = CapabilityManifest::load(manifest_path)?;
        let descriptor = self.load_descriptor(descriptor_path)?;
        Ok(self.check(&manifest, &descriptor))
    }

    /// Pure comparison over already-loaded inputs.
    pub fn check(
        &self,
        manifest: &CapabilityManifest,
        descriptor: &DeployDescriptor,
    ) -> ValidationReport {
        let mut issues = Vec::new();

        for family in ResourceFamily::ALL {
            let declared = manifest.declares(family);
            let bound = !Self::bindings_empty(descriptor, family);

            if declared && !bound {
                issues.push(ValidationIssue {
                    kind: IssueKind::CapabilityMissing,
                    severity: Severity::Error,
                    message: format!(
                        "manifest declares {family} but the descriptor has no {family} binding"
                    ),
                    suggested_fix: Some(format!(
                        "add a {} block to the descriptor or set {family} to false",
                        Self::section_name(family)
                    )),
                });
            } else if !declared && bound {
                issues.push(ValidationIssue {
                    kind: IssueKind::OrphanBinding,
                    severity: Severity::Error,
                    message: format!(
                        "descriptor binds {family} but the manifest does not declare it"
                    ),
                    suggested_fix: Some(format!(
                        "remove the {} block or declare {family} in the manifest",
                        Self::section_name(family)
                    )),
                });
            }
        }

        for name in manifest.environment.keys() {
            if !descriptor.vars.contains_key(name) {
                issues.push(ValidationIssue {
                    kind: IssueKind::MissingEnv,
                    severity: Severity::Warning,
                    message: format!("missing_env: required variable '{name}' is not set"),
                    suggested_fix: Some(format!("add {name} to the descriptor's [vars] section")),
                });
            }
        }

        let valid = !issues.iter().any(ValidationIssue::is_error);
        if valid {
            debug!("descriptor consistent with manifest ({} issue(s))", issues.len());
        } else {
            warn!("descriptor inconsistent with manifest: {} issue(s)", issues.len());
        }
        ValidationReport { valid, issues }
    }

    /// Rewrite the descriptor toward the manifest's declared state for
    /// the known-fixable issue kinds. A timestamped backup of the
    /// descriptor is written first.
    pub fn auto_fix(&self, manifest_path: &Path, descriptor_path: &Path) -> Result<FixReport> {
        let manifest = CapabilityManifest::load(manifest_path)?;
        let mut descriptor = self.load_descriptor(descriptor_path)?;
        let before = self.check(&manifest, &descriptor);
        if before.issues.is_empty() {
            return Ok(FixReport { fixed: Vec::new(), remaining: Vec::new(), backup_path: None });
        }

        let backup_path = Self::backup(descriptor_path)?;
        let mut fixed = Vec::new();

        for issue in &before.issues {
            match issue.kind {
                IssueKind::CapabilityMissing | IssueKind::OrphanBinding => {
                    Self::reconcile_bindings(&manifest, &mut descriptor);
                    fixed.push(issue.kind);
                }
                // Requirement markers carry no value to fill in, so a
                // missing variable stays a human decision.
                IssueKind::MissingEnv => {}
            }
        }

        let text = self.parser.serialize(&descriptor).map_err(|source| {
            ValidationError::FixFailed(format!("cannot serialize descriptor: {source}"))
        })?;
        std::fs::write(descriptor_path, text).map_err(|source| {
            ValidationError::FixFailed(format!(
                "cannot write descriptor {}: {source}",
                descriptor_path.display()
            ))
        })?;

        let remaining = self.check(&manifest, &descriptor).issues;
        info!(
            "auto-fix applied {} fix(es), {} issue(s) remaining",
            fixed.len(),
            remaining.len()
        );
        Ok(FixReport { fixed, remaining, backup_path: Some(backup_path) })
    }

    fn load_descriptor(&self, path: &Path) -> Result<DeployDescriptor> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            ValidationError::DescriptorRead { path: path.to_path_buf(), source }
        })?;
        self.parser.parse(&text).map_err(|source| ValidationError::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn bindings_empty(descriptor: &DeployDescriptor, family: ResourceFamily) -> bool {
        match family {
            ResourceFamily::D1 => descriptor.d1_databases.is_empty(),
            ResourceFamily::Kv => descriptor.kv_namespaces.is_empty(),
            ResourceFamily::R2 => descriptor.r2_buckets.is_empty(),
        }
    }

    fn section_name(family: ResourceFamily) -> &'static str {
        match family {
            ResourceFamily::D1 => "[[d1_databases]]",
            ResourceFamily::Kv => "[[kv_namespaces]]",
            ResourceFamily::R2 => "[[r2_buckets]]",
        }
    }

    /// Force every resource family to the manifest's declared state. The
    /// synthesized blocks match the generator's defaults so a fixed
    /// descriptor converges with a regenerated one.
    fn reconcile_bindings(manifest: &CapabilityManifest, descriptor: &mut DeployDescriptor) {
        if manifest.d1 {
            if descriptor.d1_databases.is_empty() {
                descriptor.d1_databases.push(D1Database {
                    binding: "DB".to_string(),
                    database_name: format!("{}-db", descriptor.name),
                    database_id: None,
                });
            }
        } else {
            descriptor.d1_databases.clear();
        }

        if manifest.kv {
            if descriptor.kv_namespaces.is_empty() {
                descriptor
                    .kv_namespaces
                    .push(KvNamespace { binding: "CACHE".to_string(), id: None });
            }
        } else {
            descriptor.kv_namespaces.clear();
        }

        if manifest.r2 {
            if descriptor.r2_buckets.is_empty() {
                descriptor.r2_buckets.push(R2Bucket {
                    binding: "ASSETS".to_string(),
                    bucket_name: format!("{}-assets", descriptor.name),
                });
            }
        } else {
            descriptor.r2_buckets.clear();
        }
    }

    fn backup(descriptor_path: &Path) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let backup_path = descriptor_path.with_extension(format!("toml.bak.{stamp}"));
        std::fs::copy(descriptor_path, &backup_path).map_err(|source| {
            ValidationError::FixFailed(format!(
                "cannot back up descriptor {}: {source}",
                descriptor_path.display()
            ))
        })?;
        Ok(backup_path)
    }
}
