//! Deployment binding-error recovery
//!
//! When the wrapped deployment tool fails with a binding error (a
//! mismatch between the descriptor's declared resources and what exists
//! at deploy time), the recovery manager asks the tool's remediator to
//! repair the configuration, tracks a rollback action for any backup the
//! remediation created, and retries the deploy exactly once when the
//! remediation outcome allows it.

pub mod manager;

pub use manager::{BindingRemediator, RecoveryManager, RecoveryReport};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A deploy-tool failure: exit status plus captured output.
#[derive(Debug, Clone, Error)]
#[error("deploy failed: {message}")]
pub struct DeployError {
    pub message: String,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl DeployError {
    pub fn new(message: impl Into<String>, exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self { message: message.into(), exit_code, stderr: stderr.into() }
    }
}

/// Outcome tag reported by the deployment tool's remediation routine.
/// Retryability is decided solely by exact membership in the retryable
/// set; unrecognized tags are never retryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecoveryAction {
    CreatedAndConfigured,
    DatabaseSelectedAndConfigured,
    BindingUpdated,
    Cancelled,
    CreationFailed,
    SelectionFailed,
    NoDatabasesAvailable,
    Manual,
    NotD1Error,
    Unknown(String),
}

impl RecoveryAction {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "created_and_configured" => RecoveryAction::CreatedAndConfigured,
            "database_selected_and_configured" => RecoveryAction::DatabaseSelectedAndConfigured,
            "binding_updated" => RecoveryAction::BindingUpdated,
            "cancelled" => RecoveryAction::Cancelled,
            "creation_failed" => RecoveryAction::CreationFailed,
            "selection_failed" => RecoveryAction::SelectionFailed,
            "no_databases_available" => RecoveryAction::NoDatabasesAvailable,
            "manual" => RecoveryAction::Manual,
            "not_d1_error" => RecoveryAction::NotD1Error,
            other => RecoveryAction::Unknown(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            RecoveryAction::CreatedAndConfigured => "created_and_configured",
            RecoveryAction::DatabaseSelectedAndConfigured => "database_selected_and_configured",
            RecoveryAction::BindingUpdated => "binding_updated",
            RecoveryAction::Cancelled => "cancelled",
            RecoveryAction::CreationFailed => "creation_failed",
            RecoveryAction::SelectionFailed => "selection_failed",
            RecoveryAction::NoDatabasesAvailable => "no_databases_available",
            RecoveryAction::Manual => "manual",
            RecoveryAction::NotD1Error => "not_d1_error",
            RecoveryAction::Unknown(tag) => tag,
        }
    }

    /// Whether a deploy retry is warranted after this remediation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecoveryAction::CreatedAndConfigured
                | RecoveryAction::DatabaseSelectedAndConfigured
                | RecoveryAction::BindingUpdated
        )
    }
}

impl From<String> for RecoveryAction {
    fn from(tag: String) -> Self {
        RecoveryAction::from_tag(&tag)
    }
}

impl From<RecoveryAction> for String {
    fn from(action: RecoveryAction) -> Self {
        action.as_tag().to_string()
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Whether the caller should re-invoke the deploy after a remediation
/// reported `action`.
pub fn should_retry_after_recovery(action: &RecoveryAction) -> bool {
    action.is_retryable()
}

/// A configuration backup created by a remediation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBackup {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
}

/// What the remediator did about a binding error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remediation {
    pub action: RecoveryAction,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<ConfigBackup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackKind {
    RestoreBackup,
}

/// A compensating step recorded when recovery mutates the descriptor.
/// The list is consumed most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackAction {
    pub kind: RollbackKind,
    pub backup_path: PathBuf,
    pub target_path: PathBuf,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// How a recovery attempt ended, independent of the deploy result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoveryOutcome {
    pub handled: bool,
    pub retried: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RecoveryAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The deploy failed with an error outside the recoverable binding
    /// class; the original error passes through unchanged.
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// Remediation succeeded but its action does not allow a retry.
    #[error("deploy not recoverable ({action}): {message}")]
    NotRecoverable { action: RecoveryAction, message: String },

    /// The remediator itself failed; reported, never re-raised raw.
    #[error("binding recovery failed: {message}")]
    RecoveryFailed { message: String },

    /// The single permitted retry failed as well.
    #[error("deploy failed again after binding recovery: {source}")]
    RetryFailed {
        #[source]
        source: DeployError,
    },

    #[error("rollback failed: {message}")]
    RollbackFailed { message: String },
}

impl RecoveryError {
    /// The recovery outcome this terminal error corresponds to.
    pub fn outcome(&self) -> RecoveryOutcome {
        match self {
            RecoveryError::Deploy(e) => RecoveryOutcome {
                handled: false,
                retried: false,
                action: None,
                message: Some(e.message.clone()),
            },
            RecoveryError::NotRecoverable { action, message } => RecoveryOutcome {
                handled: true,
                retried: false,
                action: Some(action.clone()),
                message: Some(message.clone()),
            },
            RecoveryError::RecoveryFailed { message } => RecoveryOutcome {
                handled: true,
                retried: false,
                action: None,
                message: Some(message.clone()),
            },
            RecoveryError::RetryFailed { source } => RecoveryOutcome {
                handled: true,
                retried: true,
                action: None,
                message: Some(source.message.clone()),
            },
            RecoveryError::RollbackFailed { message } => RecoveryOutcome {
                handled: true,
                retried: false,
                action: None,
                message: Some(message.clone()),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RecoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_set_is_exact() {
        let retryable = [
            "created_and_configured",
            "database_selected_and_configured",
            "binding_updated",
        ];
        for tag in retryable {
            assert!(should_retry_after_recovery(&RecoveryAction::from_tag(tag)), "{tag}");
        }

        let non_retryable = [
            "cancelled",
            "creation_failed",
            "selection_failed",
            "no_databases_available",
            "manual",
            "not_d1_error",
            "something_new_entirely",
            "",
        ];
        for tag in non_retryable {
            assert!(!should_retry_after_recovery(&RecoveryAction::from_tag(tag)), "{tag}");
        }
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in ["created_and_configured", "manual", "weird_future_tag"] {
            assert_eq!(RecoveryAction::from_tag(tag).as_tag(), tag);
        }
    }

    #[test]
    fn test_action_serde_uses_tags() {
        let action: RecoveryAction = serde_json::from_str("\"binding_updated\"").unwrap();
        assert_eq!(action, RecoveryAction::BindingUpdated);
        assert_eq!(serde_json::to_string(&action).unwrap(), "\"binding_updated\"");

        let unknown: RecoveryAction = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(unknown, RecoveryAction::Unknown("mystery".to_string()));
    }
}
