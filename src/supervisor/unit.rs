use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{sanitize_bot_number, ManagerConfig, ResolvedBot};
use crate::error::Result;

/// Writes and removes supervisord program sections, one file per bot.
///
/// ```ini
/// [program:misty_willow_bot1]
/// command=bash /app/misty_willow_bot1/run.sh
/// directory=/app/misty_willow_bot1
/// autostart=true
/// autorestart=true
/// startretries=5
/// stderr_logfile=/var/log/supervisor/misty_willow_bot1_err.log
/// stdout_logfile=/var/log/supervisor/misty_willow_bot1_out.log
/// environment=TOKEN="abc"
/// ```
#[derive(Debug, Clone)]
pub struct UnitWriter {
    conf_dir: PathBuf,
    app_root: PathBuf,
    log_dir: PathBuf,
    extension: String,
    start_retries: u32,
}

impl UnitWriter {
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            conf_dir: config.supervisor_conf_dir.clone(),
            app_root: config.app_root.clone(),
            log_dir: config.supervisor_log_dir.clone(),
            extension: config.unit_extension.clone(),
            start_retries: config.start_retries,
        }
    }

    /// Unit file path for a (raw or sanitized) bot number
    pub fn unit_path(&self, bot_number: &str) -> PathBuf {
        self.conf_dir
            .join(format!("{}.{}", sanitize_bot_number(bot_number), self.extension))
    }

    /// Render the program section. Deterministic for a given bot and command.
    pub fn render(&self, bot: &ResolvedBot, command: &str) -> String {
        let program = bot.unit_name();
        let directory = self.app_root.join(&program);

        let mut out = format!(
            "[program:{program}]\n\
             command={command}\n\
             directory={directory}\n\
             autostart=true\n\
             autorestart=true\n\
             startretries={retries}\n\
             stderr_logfile={stderr}\n\
             stdout_logfile={stdout}\n",
            program = program,
            command = command,
            directory = directory.display(),
            retries = self.start_retries,
            stderr = self.log_path(&program, "err").display(),
            stdout = self.log_path(&program, "out").display(),
        );

        if !bot.env.is_empty() {
            let assignments: Vec<String> = bot
                .env
                .iter()
                .map(|(key, value)| format!("{}=\"{}\"", key, value))
                .collect();
            out.push_str(&format!("environment={}\n", assignments.join(",")));
        }

        out
    }

    /// Render and write the unit, overwriting any previous file
    pub async fn write(&self, bot: &ResolvedBot, command: &str) -> Result<PathBuf> {
        let path = self.unit_path(&bot.bot_number);
        info!(
            "📝 Writing supervisord configuration for {} at {}",
            bot.bot_number,
            path.display()
        );

        tokio::fs::write(&path, self.render(bot, command)).await?;

        info!("✅ Supervisord configuration for {} written", bot.bot_number);
        Ok(path)
    }

    /// Remove a bot's unit file. Returns `false` if there was none.
    pub async fn remove(&self, bot_number: &str) -> Result<bool> {
        let path = self.unit_path(bot_number);
        if !path_exists(&path).await {
            return Ok(false);
        }

        tokio::fs::remove_file(&path).await?;
        info!("🗑️  Removed supervisord configuration for {}", bot_number);
        Ok(true)
    }

    fn log_path(&self, program: &str, stream: &str) -> PathBuf {
        self.log_dir.join(format!("{}_{}.log", program, stream))
    }
}

pub(crate) async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn writer(conf_dir: &Path) -> UnitWriter {
        UnitWriter::new(&ManagerConfig {
            supervisor_conf_dir: conf_dir.to_path_buf(),
            ..Default::default()
        })
    }

    fn bot(env: &[(&str, &str)]) -> ResolvedBot {
        ResolvedBot {
            name: "misty willow alpha".to_string(),
            bot_number: "misty willow bot1".to_string(),
            git_url: "https://github.com/kissbot/alpha.git".to_string(),
            branch: "main".to_string(),
            run_command: "run.sh".to_string(),
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_render_without_env() {
        let w = writer(Path::new("/etc/supervisor/conf.d"));
        let rendered = w.render(&bot(&[]), "bash /app/misty_willow_bot1/run.sh");

        let expected = "\
[program:misty_willow_bot1]
command=bash /app/misty_willow_bot1/run.sh
directory=/app/misty_willow_bot1
autostart=true
autorestart=true
startretries=5
stderr_logfile=/var/log/supervisor/misty_willow_bot1_err.log
stdout_logfile=/var/log/supervisor/misty_willow_bot1_out.log
";
        assert_eq!(rendered, expected);
        assert!(!rendered.contains("environment="));
    }

    #[test]
    fn test_render_env_line() {
        let w = writer(Path::new("/etc/supervisor/conf.d"));
        let rendered = w.render(&bot(&[("TOKEN", "abc"), ("CHANNEL", "kiss")]), "cmd");
        assert!(rendered.ends_with("environment=CHANNEL=\"kiss\",TOKEN=\"abc\"\n"));
    }

    #[test]
    fn test_render_full_section_with_env() {
        let w = writer(Path::new("/etc/supervisor/conf.d"));
        let rendered = w.render(&bot(&[("TOKEN", "abc")]), "bash run.sh");

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "[program:misty_willow_bot1]");
        assert_eq!(lines[5], "startretries=5");
        assert_eq!(lines[8], "environment=TOKEN=\"abc\"");
        assert!(lines.iter().all(|l| !l.starts_with(' ')));
    }

    #[test]
    fn test_render_is_deterministic() {
        let w = writer(Path::new("/etc/supervisor/conf.d"));
        let b = bot(&[("B", "2"), ("A", "1")]);
        assert_eq!(w.render(&b, "cmd"), w.render(&b, "cmd"));
    }

    #[test]
    fn test_unit_path_is_sanitized() {
        let w = writer(Path::new("/etc/supervisor/conf.d"));
        assert_eq!(
            w.unit_path("misty willow bot1"),
            PathBuf::from("/etc/supervisor/conf.d/misty_willow_bot1.conf")
        );
    }

    #[tokio::test]
    async fn test_write_overwrites_and_remove() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path());
        let b = bot(&[]);

        let path = w.write(&b, "first").await.unwrap();
        w.write(&b, "second").await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("command=second"));
        assert!(!content.contains("command=first"));

        assert!(w.remove(&b.bot_number).await.unwrap());
        assert!(!path.exists());
        assert!(!w.remove(&b.bot_number).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir.path().join("missing"));
        assert!(w.write(&bot(&[]), "cmd").await.is_err());
    }
}
