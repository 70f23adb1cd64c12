//! # KissBot Fleet
//!
//! Lifecycle manager for a fleet of bots run under supervisord:
//! - Cluster list + per-cluster environment bundles, validated as one batch
//! - Shared two-word identity prefix per fleet load
//! - git clone / venv / pip provisioning with a three-way launch command
//! - supervisord program sections and `supervisorctl` control
//! - Start-all, stop-one, restart-all and drain-on-signal workflows
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use kissbot_fleet::{config, FleetManager, ManagerConfig, ProcessRunner};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ManagerConfig::default();
//!     let bots = config::load_clusters_from_env(&settings.cluster_file)?;
//!
//!     let fleet = FleetManager::new(&settings, bots, Arc::new(ProcessRunner));
//!     let report = fleet.start_all().await;
//!     println!("started {} bots", report.started.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fleet;
pub mod identity;
pub mod logging;
pub mod provision;
pub mod runner;
pub mod supervisor;

// Re-export primary types
pub use config::{ClusterSpec, ManagerConfig, ResolvedBot};
pub use error::{FleetError, Result, ValidationError};
pub use fleet::{FleetManager, FleetReport, FleetState, ShutdownSignal};
pub use provision::{launch_command, Provisioner};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use supervisor::{SupervisorCtl, UnitWriter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
