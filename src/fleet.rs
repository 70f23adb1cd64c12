//! Fleet-wide start / stop / restart workflows.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{sanitize_bot_number, ManagerConfig, ResolvedBot};
use crate::error::{FleetError, Result};
use crate::provision::Provisioner;
use crate::runner::CommandRunner;
use crate::supervisor::{SupervisorCtl, UnitWriter};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetState {
    Idle,
    Provisioning,
    Running,
    StoppingOne,
    RestartingAll,
}

/// Outcome of a start-all pass, by unit name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetReport {
    pub started: Vec<String>,
    pub failed: Vec<String>,
    /// Not attempted because shutdown was requested mid-run
    pub skipped: Vec<String>,
}

/// Cancellation flag set by signal delivery and observed by the orchestrator
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl ShutdownSignal {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once [`trigger`](Self::trigger) has been called
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Sender is held by self, so the channel cannot close while waiting
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

// ============================================================================
// Fleet manager
// ============================================================================

/// Orchestrator context: the resolved fleet plus every collaborator it drives
pub struct FleetManager {
    bots: Vec<ResolvedBot>,
    provisioner: Provisioner,
    units: UnitWriter,
    ctl: SupervisorCtl,
    stop_grace_period: Duration,
    /// Serializes the whole clone/build/write/reload sequence across the fleet
    start_lock: Mutex<()>,
    state: RwLock<FleetState>,
    shutdown: ShutdownSignal,
}

impl FleetManager {
    pub fn new(
        config: &ManagerConfig,
        bots: Vec<ResolvedBot>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        info!("📋 Fleet manager initialized with {} bots", bots.len());

        Self {
            bots,
            provisioner: Provisioner::new(config, Arc::clone(&runner)),
            units: UnitWriter::new(config),
            ctl: SupervisorCtl::new(runner, config.supervisorctl.clone()),
            stop_grace_period: config.stop_grace_period,
            start_lock: Mutex::new(()),
            state: RwLock::new(FleetState::Idle),
            shutdown: ShutdownSignal::default(),
        }
    }

    pub fn bots(&self) -> &[ResolvedBot] {
        &self.bots
    }

    pub async fn state(&self) -> FleetState {
        *self.state.read().await
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    async fn set_state(&self, state: FleetState) -> FleetState {
        std::mem::replace(&mut *self.state.write().await, state)
    }

    /// Provision every bot in order. A failing bot is logged and skipped.
    ///
    /// Once shutdown has been requested no further bot is started; the bot
    /// already in flight is allowed to finish.
    pub async fn start_all(&self) -> FleetReport {
        info!("🚀 Starting all bots...");
        self.set_state(FleetState::Provisioning).await;

        let mut report = FleetReport::default();
        for bot in &self.bots {
            if self.shutdown.is_triggered() {
                warn!("⚠️  {}: Shutdown requested, not starting", bot.bot_number);
                report.skipped.push(bot.unit_name());
                continue;
            }

            if bot.run_command.ends_with(".sh") {
                info!("🔧 Installing normally for {}", bot.bot_number);
            } else {
                info!("🐍 Setting up isolated venv environment for {}", bot.bot_number);
            }

            match self.start_bot(bot).await {
                Ok(()) => report.started.push(bot.unit_name()),
                Err(FleetError::ShutdownRequested) => {
                    warn!("⚠️  {}: Shutdown requested, not starting", bot.bot_number);
                    report.skipped.push(bot.unit_name());
                }
                Err(e) => {
                    error!("❌ Error while processing {}: {}", bot.bot_number, e);
                    report.failed.push(bot.unit_name());
                }
            }
        }

        self.set_state(FleetState::Running).await;
        info!(
            "📊 Start-all finished: {} started, {} failed, {} skipped",
            report.started.len(),
            report.failed.len(),
            report.skipped.len()
        );
        report
    }

    /// Provision one bot and reload supervisord, holding the fleet lock
    pub async fn start_bot(&self, bot: &ResolvedBot) -> Result<()> {
        let _guard = self.start_lock.lock().await;
        if self.shutdown.is_triggered() {
            return Err(FleetError::ShutdownRequested);
        }

        info!("🤖 Starting bot: {}", bot.bot_number);
        self.provisioner.provision(bot).await?;
        self.ctl.reload().await;

        info!("✅ {} started via supervisord", bot.bot_number);
        Ok(())
    }

    /// Stop one bot, wait the grace period, remove its unit and reload.
    /// The fleet is `Idle` afterwards.
    ///
    /// Never fails on supervisor errors; only unit removal I/O errors are returned.
    pub async fn stop_one(&self, bot_number: &str) -> Result<()> {
        self.set_state(FleetState::StoppingOne).await;
        let result = self.stop_bot(bot_number).await;
        self.set_state(FleetState::Idle).await;
        result
    }

    async fn stop_bot(&self, bot_number: &str) -> Result<()> {
        info!("🛑 Stopping bot: {}", bot_number);
        let unit_name = sanitize_bot_number(bot_number);

        if !self.ctl.stop(&unit_name).await {
            error!("❌ Failed to stop bot {}", bot_number);
        }
        sleep(self.stop_grace_period).await;

        let removed = self.units.remove(bot_number).await;
        self.ctl.reload().await;
        removed.map(|_| ())
    }

    /// Stop and deregister every known bot one after another, then reload once
    pub async fn restart_all(&self) {
        info!("🔄 Restarting all bots...");
        self.set_state(FleetState::RestartingAll).await;

        for bot in &self.bots {
            if let Err(e) = self.stop_bot(&bot.bot_number).await {
                error!("❌ Failed to deregister {}: {}", bot.bot_number, e);
            }
        }
        self.ctl.reload().await;

        self.set_state(FleetState::Idle).await;
    }

    /// Shutdown path: stop and deregister the whole fleet
    pub async fn drain(&self) {
        info!("🧹 Draining fleet before exit...");
        self.restart_all().await;
        info!("✅ Fleet drained");
    }

    /// `--restart` mode: stop every unit concurrently, then reload once.
    /// Unit files are kept, so supervisord brings the bots back up on update.
    pub async fn restart_running(&self) {
        info!("🔄 Restarting bot manager...");
        self.set_state(FleetState::RestartingAll).await;

        let stops = self.bots.iter().map(|bot| {
            let unit_name = bot.unit_name();
            async move { self.ctl.stop(&unit_name).await }
        });
        let results = join_all(stops).await;
        let failed = results.iter().filter(|ok| !**ok).count();
        if failed > 0 {
            warn!("⚠️  {} stop commands failed", failed);
        }

        self.ctl.reload().await;
        self.set_state(FleetState::Running).await;
    }
}
