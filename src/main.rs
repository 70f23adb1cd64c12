use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use kissbot_fleet::{config, logging, FleetManager, ManagerConfig, ProcessRunner};
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "kissbot-fleet")]
#[command(about = "Bot Manager", long_about = None)]
struct Cli {
    /// Restart all bots
    #[arg(long)]
    restart: bool,

    /// Stay resident after starting and drain the fleet on SIGINT/SIGTERM
    #[arg(long)]
    hold: bool,

    /// Cluster list document
    #[arg(long, env = "BOT_MANAGER_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Dotenv file with the per-cluster detail bundles
    #[arg(long, env = "BOT_MANAGER_ENV_FILE", default_value = "cluster.env")]
    env_file: PathBuf,

    /// Parent directory of the bot checkouts
    #[arg(long, env = "BOT_MANAGER_APP_ROOT", default_value = "/app")]
    app_root: PathBuf,

    /// supervisord program directory
    #[arg(long, env = "BOT_MANAGER_SUPERVISOR_CONF_DIR", default_value = "/etc/supervisor/conf.d")]
    supervisor_conf_dir: PathBuf,

    /// supervisord stdout/stderr log directory
    #[arg(long, env = "BOT_MANAGER_SUPERVISOR_LOG_DIR", default_value = "/var/log/supervisor")]
    supervisor_log_dir: PathBuf,

    /// Seconds to wait after `supervisorctl stop`
    #[arg(long, env = "BOT_MANAGER_STOP_GRACE", default_value = "5")]
    stop_grace_secs: u64,

    /// Directory for the manager's own log file
    #[arg(long, env = "BOT_MANAGER_LOG_DIR", default_value = ".")]
    log_dir: PathBuf,

    /// File name of the manager's own log
    #[arg(long, env = "BOT_MANAGER_LOG_FILE", default_value = "bot_manager.log")]
    log_file: String,
}

impl Cli {
    fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            cluster_file: self.config.clone(),
            env_file: self.env_file.clone(),
            app_root: self.app_root.clone(),
            supervisor_conf_dir: self.supervisor_conf_dir.clone(),
            supervisor_log_dir: self.supervisor_log_dir.clone(),
            stop_grace_period: Duration::from_secs(self.stop_grace_secs),
            log_dir: self.log_dir.clone(),
            log_file: self.log_file.clone(),
            ..Default::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.manager_config();
    let _log_guard = logging::init_tracing(&settings.log_dir, &settings.log_file)?;

    config::load_env_file(&settings.env_file);
    let bots = config::load_clusters_from_env(&settings.cluster_file)?;

    let fleet = FleetManager::new(&settings, bots, Arc::new(ProcessRunner));
    let shutdown = fleet.shutdown_signal();

    // Signals only raise the flag; draining runs on the main task
    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let signals_handle = signals.handle();
    let signal_flag = shutdown.clone();
    let signal_task = tokio::spawn(async move {
        while let Some(signal) = signals.next().await {
            info!("🛑 Received signal {:?}, shutting down...", signal);
            signal_flag.trigger();
        }
    });

    if cli.restart {
        fleet.restart_running().await;
    } else {
        info!("🚀 Starting bot manager...");
        fleet.start_all().await;

        if cli.hold && !shutdown.is_triggered() {
            info!("⏳ Fleet running, waiting for SIGINT/SIGTERM");
            shutdown.wait().await;
        }
    }

    if shutdown.is_triggered() {
        fleet.drain().await;
    }

    signals_handle.close();
    let _ = signal_task.await;

    info!("✅ Bot manager stopped");
    Ok(())
}
