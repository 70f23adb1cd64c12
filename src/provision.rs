//! Bot provisioning: clone, optional venv + dependencies, launch command, unit file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::argv;
use crate::config::{ManagerConfig, ResolvedBot};
use crate::error::Result;
use crate::runner::{run_checked, CommandRunner};
use crate::supervisor::unit::path_exists;
use crate::supervisor::UnitWriter;

const REQUIREMENTS_FILE: &str = "requirements.txt";
const VENV_DIR: &str = "venv";

/// Build the supervisord `command=` line for a bot's run_command.
///
/// * `*.sh` → `bash <bot_dir>/<run_command>`
/// * `*.py` → `<venv>/bin/python3 <bot_dir>/<run_command>`
/// * anything else → `<venv>/bin/python3 -m <stem>`
pub fn launch_command(bot_dir: &Path, run_command: &str) -> String {
    let bot_file = bot_dir.join(run_command);
    let python = bot_dir.join(VENV_DIR).join("bin").join("python3");

    match bot_file.extension().and_then(|e| e.to_str()) {
        Some("sh") => format!("bash {}", bot_file.display()),
        Some("py") => format!("{} {}", python.display(), bot_file.display()),
        _ => {
            let stem = bot_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{} -m {}", python.display(), stem)
        }
    }
}

/// Materializes one bot's code and environment and writes its unit file
pub struct Provisioner {
    runner: Arc<dyn CommandRunner>,
    units: UnitWriter,
    app_root: PathBuf,
    git: String,
    python: String,
}

impl Provisioner {
    pub fn new(config: &ManagerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            units: UnitWriter::new(config),
            app_root: config.app_root.clone(),
            git: config.git.clone(),
            python: config.python.clone(),
        }
    }

    /// Working directory of a bot
    pub fn bot_dir(&self, bot: &ResolvedBot) -> PathBuf {
        self.app_root.join(bot.unit_name())
    }

    /// Clone, build the venv if needed and write the unit.
    ///
    /// Returns the unit file path. Nothing is written to the supervisor
    /// directory unless every preceding step succeeded. Reloading supervisord
    /// is left to the caller.
    pub async fn provision(&self, bot: &ResolvedBot) -> Result<PathBuf> {
        let bot_dir = self.bot_dir(bot);

        if path_exists(&bot_dir).await {
            info!("🧹 Removing existing directory: {}", bot_dir.display());
            tokio::fs::remove_dir_all(&bot_dir).await?;
        }

        info!(
            "📥 Cloning {} from {} (branch: {})",
            bot.bot_number, bot.git_url, bot.branch
        );
        run_checked(
            self.runner.as_ref(),
            &argv![
                self.git,
                "clone",
                "-b",
                bot.branch,
                "--single-branch",
                "--depth",
                "1",
                bot.git_url,
                bot_dir.display()
            ],
        )
        .await?;

        let requirements = bot_dir.join(REQUIREMENTS_FILE);
        if path_exists(&requirements).await {
            self.install_requirements(bot, &bot_dir, &requirements).await?;
        }

        let command = launch_command(&bot_dir, &bot.run_command);
        self.units.write(bot, &command).await
    }

    async fn install_requirements(
        &self,
        bot: &ResolvedBot,
        bot_dir: &Path,
        requirements: &Path,
    ) -> Result<()> {
        let venv = bot_dir.join(VENV_DIR);

        info!("🐍 Creating virtual environment for {}", bot.bot_number);
        run_checked(
            self.runner.as_ref(),
            &argv![self.python, "-m", "venv", venv.display()],
        )
        .await?;

        info!("📦 Installing requirements for {}", bot.bot_number);
        let pip = venv.join("bin").join("pip");
        run_checked(
            self.runner.as_ref(),
            &argv![
                pip.display(),
                "install",
                "--no-cache-dir",
                "-r",
                requirements.display()
            ],
        )
        .await?;

        Ok(())
    }
}
