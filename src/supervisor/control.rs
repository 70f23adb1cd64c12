use std::sync::Arc;
use tracing::{error, info};

use crate::runner::CommandRunner;

/// Bridge to `supervisorctl`. Failures are logged, never returned as errors.
#[derive(Clone)]
pub struct SupervisorCtl {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl SupervisorCtl {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Issue one control command. Returns whether it succeeded.
    pub async fn control(&self, args: &[&str]) -> bool {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(args.iter().map(|a| a.to_string()));

        match self.runner.run(&argv).await {
            Ok(output) if output.success() => {
                info!(
                    "✅ Supervisorctl {} succeeded: {}",
                    args.join(" "),
                    output.stdout.trim()
                );
                true
            }
            Ok(output) => {
                error!(
                    "❌ Supervisorctl {} failed (exit {}): {}",
                    args.join(" "),
                    output.code,
                    output.stderr.trim()
                );
                false
            }
            Err(e) => {
                error!("❌ Supervisorctl {} failed: {}", args.join(" "), e);
                false
            }
        }
    }

    pub async fn reread(&self) -> bool {
        self.control(&["reread"]).await
    }

    pub async fn update(&self) -> bool {
        self.control(&["update"]).await
    }

    pub async fn stop(&self, unit_name: &str) -> bool {
        self.control(&["stop", unit_name]).await
    }

    /// Re-scan config files, then apply changes. Both steps always run.
    pub async fn reload(&self) -> bool {
        info!("🔄 Reloading supervisord...");
        let reread = self.reread().await;
        let update = self.update().await;
        if reread && update {
            info!("✅ Supervisord updated");
        }
        reread && update
    }
}
