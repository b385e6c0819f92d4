//! Recovery manager driving the deploy/remediate/retry loop

use super::{
    ConfigBackup, DeployError, RecoveryError, RecoveryOutcome, Remediation, Result,
    RollbackAction, RollbackKind,
};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Seam to the wrapped deployment tool: classifies whether a failure is
/// a recoverable binding error and, if so, remediates it (create the
/// resource, select an existing one, or update the binding).
#[async_trait]
pub trait BindingRemediator: Send + Sync {
    /// Whether `error` belongs to the recoverable binding-error class.
    fn is_binding_error(&self, error: &DeployError) -> bool;

    /// Attempt to repair the configuration behind `error`.
    async fn remediate(&self, error: &DeployError) -> anyhow::Result<Remediation>;
}

/// A successful deploy, possibly after one recovery round.
#[derive(Debug, Clone)]
pub struct RecoveryReport<T> {
    pub output: T,
    pub outcome: RecoveryOutcome,
}

/// Owns the remediator seam and the rollback list.
///
/// The rollback list lives behind a mutex so concurrent recovery
/// attempts against one manager serialize their appends; entries are
/// kept most-recent-first and consumed in LIFO order.
pub struct RecoveryManager<R: BindingRemediator> {
    remediator: R,
    rollback: Mutex<Vec<RollbackAction>>,
}

impl<R: BindingRemediator> RecoveryManager<R> {
    pub fn new(remediator: R) -> Self {
        Self { remediator, rollback: Mutex::new(Vec::new()) }
    }

    /// Run `deploy`; on a recognized binding error, remediate and retry
    /// exactly once. A second failure is terminal.
    pub async fn deploy_with_recovery<F, Fut, T>(&self, deploy: F) -> Result<RecoveryReport<T>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, DeployError>>,
    {
        let first_error = match deploy().await {
            Ok(output) => {
                return Ok(RecoveryReport { output, outcome: RecoveryOutcome::default() });
            }
            Err(e) => e,
        };

        if !self.remediator.is_binding_error(&first_error) {
            return Err(RecoveryError::Deploy(first_error));
        }

        info!("deploy hit a binding error, attempting remediation: {}", first_error.message);
        let remediation = match self.remediator.remediate(&first_error).await {
            Ok(remediation) => remediation,
            Err(e) => {
                // A failing remediator is reported, never re-raised raw.
                warn!("remediator failed: {e}");
                return Err(RecoveryError::RecoveryFailed {
                    message: format!("remediation of '{}' failed: {e}", first_error.message),
                });
            }
        };

        if let Some(backup) = &remediation.backup {
            self.push_rollback(backup, &remediation);
        }

        if !remediation.action.is_retryable() {
            info!("remediation '{}' does not allow a retry", remediation.action);
            return Err(RecoveryError::NotRecoverable {
                action: remediation.action,
                message: remediation.message,
            });
        }

        info!("remediation '{}' applied, retrying deploy once", remediation.action);
        match deploy().await {
            Ok(output) => Ok(RecoveryReport {
                output,
                outcome: RecoveryOutcome {
                    handled: true,
                    retried: true,
                    action: Some(remediation.action),
                    message: Some(remediation.message),
                },
            }),
            // One retry, ever. A second failure is terminal.
            Err(e) => Err(RecoveryError::RetryFailed { source: e }),
        }
    }

    /// Snapshot of the pending rollback actions, most recent first.
    pub fn rollback_actions(&self) -> Vec<RollbackAction> {
        self.lock_rollback().clone()
    }

    /// Apply and drain every pending rollback action in LIFO order.
    /// Returns the actions applied.
    pub fn execute_rollback(&self) -> Result<Vec<RollbackAction>> {
        let actions: Vec<RollbackAction> = self.lock_rollback().drain(..).collect();
        for action in &actions {
            match action.kind {
                RollbackKind::RestoreBackup => {
                    std::fs::copy(&action.backup_path, &action.target_path).map_err(|e| {
                        RecoveryError::RollbackFailed {
                            message: format!(
                                "cannot restore {} from {}: {e}",
                                action.target_path.display(),
                                action.backup_path.display()
                            ),
                        }
                    })?;
                    info!("restored {} from backup", action.target_path.display());
                }
            }
        }
        Ok(actions)
    }

    fn push_rollback(&self, backup: &ConfigBackup, remediation: &Remediation) {
        let action = RollbackAction {
            kind: RollbackKind::RestoreBackup,
            backup_path: backup.backup_path.clone(),
            target_path: backup.original_path.clone(),
            description: format!(
                "restore {} (before remediation '{}')",
                backup.original_path.display(),
                remediation.action
            ),
            created_at: Utc::now(),
        };
        // Most-recent-first so rollback consumes in LIFO order.
        self.lock_rollback().insert(0, action);
    }

    fn lock_rollback(&self) -> std::sync::MutexGuard<'_, Vec<RollbackAction>> {
        self.rollback.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::RecoveryAction;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct ScriptedRemediator {
        recognizes: bool,
        action: RecoveryAction,
        backup: Option<ConfigBackup>,
        fails: bool,
        calls: AtomicUsize,
    }

    impl ScriptedRemediator {
        fn retryable() -> Self {
            Self {
                recognizes: true,
                action: RecoveryAction::CreatedAndConfigured,
                backup: None,
                fails: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BindingRemediator for ScriptedRemediator {
        fn is_binding_error(&self, _error: &DeployError) -> bool {
            self.recognizes
        }

        async fn remediate(&self, _error: &DeployError) -> anyhow::Result<Remediation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fails {
                anyhow::bail!("wrangler d1 create blew up");
            }
            Ok(Remediation {
                action: self.action.clone(),
                message: format!("remediated via {}", self.action),
                backup: self.backup.clone(),
            })
        }
    }

    fn binding_error() -> DeployError {
        DeployError::new("binding DB not found", Some(1), "D1_ERROR: no such database")
    }

    #[tokio::test]
    async fn test_successful_deploy_needs_no_recovery() {
        let manager = RecoveryManager::new(ScriptedRemediator::retryable());
        let report = manager
            .deploy_with_recovery(|| async { Ok::<_, DeployError>("deployed") })
            .await
            .unwrap();
        assert_eq!(report.output, "deployed");
        assert!(!report.outcome.handled);
        assert_eq!(manager.remediator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retryable_action_retries_exactly_once() {
        let manager = RecoveryManager::new(ScriptedRemediator::retryable());
        let attempts = AtomicUsize::new(0);

        let report = manager
            .deploy_with_recovery(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 { Err(binding_error()) } else { Ok("deployed after fix") }
                }
            })
            .await
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(report.outcome.handled);
        assert!(report.outcome.retried);
        assert_eq!(report.outcome.action, Some(RecoveryAction::CreatedAndConfigured));
    }

    #[tokio::test]
    async fn test_second_failure_is_terminal() {
        let manager = RecoveryManager::new(ScriptedRemediator::retryable());
        let attempts = AtomicUsize::new(0);

        let err = manager
            .deploy_with_recovery(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(binding_error()) }
            })
            .await
            .unwrap_err();

        // Never a second retry.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(matches!(err, RecoveryError::RetryFailed { .. }));
        assert_eq!(manager.remediator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_error_propagates_unchanged() {
        let mut remediator = ScriptedRemediator::retryable();
        remediator.recognizes = false;
        let manager = RecoveryManager::new(remediator);

        let err = manager
            .deploy_with_recovery(|| async {
                Err::<(), _>(DeployError::new("quota exceeded", Some(1), ""))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RecoveryError::Deploy(_)));
        assert_eq!(err.to_string(), "deploy failed: quota exceeded");
        assert!(!err.outcome().handled);
        assert_eq!(manager.remediator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_retryable_action_reports_remediation_message() {
        let mut remediator = ScriptedRemediator::retryable();
        remediator.action = RecoveryAction::Cancelled;
        let manager = RecoveryManager::new(remediator);
        let attempts = AtomicUsize::new(0);

        let err = manager
            .deploy_with_recovery(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(binding_error()) }
            })
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            &err,
            RecoveryError::NotRecoverable { action: RecoveryAction::Cancelled, message }
                if message.contains("cancelled")
        ));
        let outcome = err.outcome();
        assert!(outcome.handled);
        assert!(!outcome.retried);
    }

    #[tokio::test]
    async fn test_remediator_failure_is_reported_not_raised() {
        let mut remediator = ScriptedRemediator::retryable();
        remediator.fails = true;
        let manager = RecoveryManager::new(remediator);

        let err = manager
            .deploy_with_recovery(|| async { Err::<(), _>(binding_error()) })
            .await
            .unwrap_err();

        assert!(matches!(err, RecoveryError::RecoveryFailed { .. }));
        assert!(err.to_string().contains("blew up"));
        let outcome = err.outcome();
        assert!(outcome.handled);
        assert!(!outcome.retried);
    }

    #[tokio::test]
    async fn test_rollback_list_is_lifo() {
        let temp_dir = TempDir::new().unwrap();
        let first_backup = ConfigBackup {
            original_path: temp_dir.path().join("wrangler.toml"),
            backup_path: temp_dir.path().join("wrangler.toml.bak.1"),
        };
        let second_backup = ConfigBackup {
            original_path: temp_dir.path().join("wrangler.toml"),
            backup_path: temp_dir.path().join("wrangler.toml.bak.2"),
        };

        let mut remediator = ScriptedRemediator::retryable();
        remediator.action = RecoveryAction::Manual;
        remediator.backup = Some(first_backup.clone());
        let manager = RecoveryManager::new(remediator);

        let _ = manager
            .deploy_with_recovery(|| async { Err::<(), _>(binding_error()) })
            .await;

        // Swap in the second backup for the next attempt.
        {
            let actions = manager.rollback_actions();
            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].backup_path, first_backup.backup_path);
        }
        manager.push_rollback(
            &second_backup,
            &Remediation {
                action: RecoveryAction::BindingUpdated,
                message: "updated".to_string(),
                backup: None,
            },
        );

        let actions = manager.rollback_actions();
        assert_eq!(actions.len(), 2);
        // Most recent first.
        assert_eq!(actions[0].backup_path, second_backup.backup_path);
        assert_eq!(actions[1].backup_path, first_backup.backup_path);
    }

    #[tokio::test]
    async fn test_execute_rollback_restores_backups() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("wrangler.toml");
        let backup = temp_dir.path().join("wrangler.toml.bak");
        std::fs::write(&target, "mutated").unwrap();
        std::fs::write(&backup, "original").unwrap();

        let mut remediator = ScriptedRemediator::retryable();
        remediator.action = RecoveryAction::Cancelled;
        remediator.backup =
            Some(ConfigBackup { original_path: target.clone(), backup_path: backup });
        let manager = RecoveryManager::new(remediator);

        let _ = manager
            .deploy_with_recovery(|| async { Err::<(), _>(binding_error()) })
            .await;

        let applied = manager.execute_rollback().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "original");
        assert!(manager.rollback_actions().is_empty());
    }
}
