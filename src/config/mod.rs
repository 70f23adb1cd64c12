pub mod loader;
pub mod validate;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub use loader::{load_clusters, load_clusters_from_env, load_env_file};
pub use validate::validate_clusters;

// ============================================================================
// Manager settings
// ============================================================================

/// Runtime settings of the fleet manager (paths, external tools, timings)
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Cluster list document
    pub cluster_file: PathBuf,
    /// Dotenv file holding the per-cluster detail bundles
    pub env_file: PathBuf,
    /// Parent of every bot working directory
    pub app_root: PathBuf,
    /// Directory watched by supervisord for program sections
    pub supervisor_conf_dir: PathBuf,
    /// Where supervisord writes each bot's stdout/stderr
    pub supervisor_log_dir: PathBuf,
    pub unit_extension: String,
    pub supervisorctl: String,
    pub git: String,
    pub python: String,
    /// Grace period between `supervisorctl stop` and unit removal
    pub stop_grace_period: Duration,
    /// `startretries` written into every unit
    pub start_retries: u32,
    /// Directory of the manager's own rotating log
    pub log_dir: PathBuf,
    pub log_file: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cluster_file: PathBuf::from("config.json"),
            env_file: PathBuf::from("cluster.env"),
            app_root: PathBuf::from("/app"),
            supervisor_conf_dir: PathBuf::from("/etc/supervisor/conf.d"),
            supervisor_log_dir: PathBuf::from("/var/log/supervisor"),
            unit_extension: "conf".to_string(),
            supervisorctl: "supervisorctl".to_string(),
            git: "git".to_string(),
            python: "python3".to_string(),
            stop_grace_period: Duration::from_secs(5),
            start_retries: 5,
            log_dir: PathBuf::from("."),
            log_file: "bot_manager.log".to_string(),
        }
    }
}

// ============================================================================
// Cluster records
// ============================================================================

/// Raw cluster definition, resolved from the environment but not yet prefixed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
    pub bot_number: String,
    pub git_url: String,
    pub branch: String,
    pub run_command: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ClusterSpec {
    /// Build a spec from a details bundle `[bot_number, git_url, branch, run_command, env?]`.
    ///
    /// Returns `None` when the bundle has fewer than four elements. Positional
    /// entries that are not scalars become empty strings and are caught by the validator.
    pub fn from_details(name: &str, details: &[Value]) -> Option<Self> {
        if details.len() < 4 {
            return None;
        }

        let env = match details.get(4) {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), scalar_to_string(v).unwrap_or_else(|| v.to_string())))
                .collect(),
            _ => BTreeMap::new(),
        };

        Some(Self {
            name: name.to_string(),
            bot_number: scalar_to_string(&details[0]).unwrap_or_default(),
            git_url: scalar_to_string(&details[1]).unwrap_or_default(),
            branch: scalar_to_string(&details[2]).unwrap_or_default(),
            run_command: scalar_to_string(&details[3]).unwrap_or_default(),
            env,
        })
    }

    /// Apply the fleet identity prefix to `name` and `bot_number`
    pub fn resolve(self, prefix: &str) -> ResolvedBot {
        ResolvedBot {
            name: format!("{} {}", prefix, self.name),
            bot_number: format!("{} {}", prefix, self.bot_number),
            git_url: self.git_url,
            branch: self.branch,
            run_command: self.run_command,
            env: self.env,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One bot of the current fleet run. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBot {
    pub name: String,
    pub bot_number: String,
    pub git_url: String,
    pub branch: String,
    pub run_command: String,
    pub env: BTreeMap<String, String>,
}

impl ResolvedBot {
    /// Supervisor program name, working directory name and unit file stem
    pub fn unit_name(&self) -> String {
        sanitize_bot_number(&self.bot_number)
    }
}

/// Replace spaces with underscores so a bot number can be used as a program/file name
pub fn sanitize_bot_number(bot_number: &str) -> String {
    bot_number.replace(' ', "_")
}
