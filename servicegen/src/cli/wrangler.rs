//! Wrapped wrangler invocation
//!
//! The deploy tool is invoked, not reimplemented: deploys shell out to
//! `wrangler deploy`, and the remediator repairs database-binding errors
//! by creating the missing database with `wrangler d1 create` and
//! rewriting the descriptor, with a backup taken first.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use servicegen_core::descriptor::{DescriptorParser, TomlDescriptorParser};
use servicegen_core::recovery::{
    BindingRemediator, ConfigBackup, DeployError, RecoveryAction, Remediation,
};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

const DESCRIPTOR_FILE: &str = "wrangler.toml";

/// Runs `wrangler deploy` for one service directory.
pub struct WranglerCli {
    service_dir: PathBuf,
    env: Option<String>,
}

impl WranglerCli {
    pub fn new(service_dir: PathBuf, env: Option<String>) -> Self {
        Self { service_dir, env }
    }

    pub async fn deploy(&self) -> std::result::Result<String, DeployError> {
        let mut cmd = Command::new("wrangler");
        cmd.arg("deploy").current_dir(&self.service_dir);
        if let Some(env) = &self.env {
            cmd.args(["--env", env]);
        }

        debug!("running wrangler deploy in {}", self.service_dir.display());
        let output = cmd.output().await.map_err(|e| {
            DeployError::new(format!("cannot run wrangler: {e}"), None, String::new())
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let message = stderr
                .lines()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("wrangler deploy failed")
                .to_string();
            Err(DeployError::new(message, output.status.code(), stderr))
        }
    }
}

/// Repairs database-binding errors through the wrangler CLI.
pub struct WranglerRemediator {
    service_dir: PathBuf,
}

impl WranglerRemediator {
    pub fn new(service_dir: PathBuf) -> Self {
        Self { service_dir }
    }

    fn descriptor_path(&self) -> PathBuf {
        self.service_dir.join(DESCRIPTOR_FILE)
    }

    fn back_up_descriptor(&self) -> Result<ConfigBackup> {
        let original = self.descriptor_path();
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let backup = original.with_extension(format!("toml.bak.{stamp}"));
        std::fs::copy(&original, &backup)
            .with_context(|| format!("cannot back up {}", original.display()))?;
        Ok(ConfigBackup { original_path: original, backup_path: backup })
    }
}

#[async_trait]
impl BindingRemediator for WranglerRemediator {
    fn is_binding_error(&self, error: &DeployError) -> bool {
        let haystack = format!("{}\n{}", error.message, error.stderr);
        haystack.contains("D1_ERROR")
            || (haystack.contains("binding") && haystack.contains("d1_database"))
    }

    async fn remediate(&self, error: &DeployError) -> Result<Remediation> {
        let parser = TomlDescriptorParser;
        let descriptor_path = self.descriptor_path();
        let text = std::fs::read_to_string(&descriptor_path)
            .with_context(|| format!("cannot read {}", descriptor_path.display()))?;
        let mut descriptor = parser.parse(&text).context("descriptor is not parseable")?;

        let Some(database) = descriptor.d1_databases.first().cloned() else {
            return Ok(Remediation {
                action: RecoveryAction::NotD1Error,
                message: "the descriptor has no database binding to repair".to_string(),
                backup: None,
            });
        };

        info!(
            "creating missing database '{}' for binding '{}'",
            database.database_name, database.binding
        );
        let backup = self.back_up_descriptor()?;

        let output = Command::new("wrangler")
            .args(["d1", "create", &database.database_name])
            .current_dir(&self.service_dir)
            .output()
            .await
            .context("cannot run wrangler d1 create")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("wrangler d1 create failed: {stderr}");
            return Ok(Remediation {
                action: RecoveryAction::CreationFailed,
                message: format!(
                    "could not create database '{}': {}",
                    database.database_name,
                    stderr.lines().next().unwrap_or("unknown error")
                ),
                backup: Some(backup),
            });
        }

        // wrangler prints a descriptor snippet containing the new id.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(id) = extract_database_id(&stdout) {
            if let Some(entry) = descriptor.d1_databases.first_mut() {
                entry.database_id = Some(id);
            }
            let updated = parser.serialize(&descriptor).context("cannot serialize descriptor")?;
            std::fs::write(&descriptor_path, updated)
                .with_context(|| format!("cannot write {}", descriptor_path.display()))?;
        }

        Ok(Remediation {
            action: RecoveryAction::CreatedAndConfigured,
            message: format!(
                "created database '{}' and updated the binding for '{}'",
                database.database_name, error.message
            ),
            backup: Some(backup),
        })
    }
}

fn extract_database_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find(|line| line.contains("database_id"))
        .and_then(|line| line.split('"').nth(1))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_database_id_from_snippet() {
        let stdout = "✅ Created DB\n[[d1_databases]]\nbinding = \"DB\"\ndatabase_id = \"abc-123\"\n";
        assert_eq!(extract_database_id(stdout), Some("abc-123".to_string()));
        assert_eq!(extract_database_id("no ids here"), None);
    }

    #[test]
    fn test_binding_error_classification() {
        let remediator = WranglerRemediator::new(PathBuf::from("/tmp"));
        let d1 = DeployError::new("deploy failed", Some(1), "D1_ERROR: binding DB has no database");
        assert!(remediator.is_binding_error(&d1));

        let other = DeployError::new("quota exceeded", Some(1), "workers.api.error.quota");
        assert!(!remediator.is_binding_error(&other));
    }
}
