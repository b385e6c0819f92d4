//! Deploy command handler

use crate::cli::app::DeployArgs;
use crate::cli::wrangler::{WranglerCli, WranglerRemediator};
use anyhow::{Context, Result};
use servicegen_core::recovery::RecoveryManager;
use tracing::info;

/// Handle the deploy command
pub async fn execute(args: DeployArgs) -> Result<()> {
    let service_dir = if args.service_dir.is_absolute() {
        args.service_dir.clone()
    } else {
        std::env::current_dir()
            .context("cannot resolve current directory")?
            .join(&args.service_dir)
    };

    let tool = WranglerCli::new(service_dir.clone(), args.env.clone());
    let manager = RecoveryManager::new(WranglerRemediator::new(service_dir));

    match manager.deploy_with_recovery(|| tool.deploy()).await {
        Ok(report) => {
            if report.outcome.retried {
                info!("deploy succeeded after binding recovery");
                if let Some(message) = &report.outcome.message {
                    println!("recovered: {message}");
                }
            }
            println!("deploy succeeded");
            Ok(())
        }
        Err(e) => {
            let outcome = e.outcome();
            eprintln!(
                "deploy failed (recovery handled: {}, retried: {})",
                outcome.handled, outcome.retried
            );

            let pending = manager.rollback_actions();
            if args.rollback_on_failure && !pending.is_empty() {
                let applied =
                    manager.execute_rollback().context("rollback after failed deploy")?;
                for action in &applied {
                    println!("rolled back: {}", action.description);
                }
            } else if !pending.is_empty() {
                eprintln!(
                    "{} descriptor backup(s) pending; rerun with --rollback-on-failure to restore",
                    pending.len()
                );
            }

            Err(e.into())
        }
    }
}
