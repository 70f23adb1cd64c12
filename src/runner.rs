//! External command execution.
//!
//! git, python/pip and supervisorctl are all reached through [`CommandRunner`],
//! so the orchestration logic can be exercised without spawning processes.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{FleetError, Result};

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs an argv to completion and captures its exit code and output streams
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments. `Err` only when the
    /// command could not be started; a non-zero exit is reported in the output.
    async fn run(&self, argv: &[String]) -> Result<CommandOutput>;
}

/// Run a command and turn a non-zero exit into [`FleetError::CommandFailed`]
pub async fn run_checked(runner: &dyn CommandRunner, argv: &[String]) -> Result<CommandOutput> {
    let output = runner.run(argv).await?;
    if output.success() {
        Ok(output)
    } else {
        Err(FleetError::CommandFailed {
            command: argv.join(" "),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| FleetError::from("empty command line"))?;

        debug!("▶️  {}", argv.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| FleetError::Spawn {
                command: argv.join(" "),
                source,
            })?;

        Ok(CommandOutput {
            // Killed by a signal: no exit code
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Build an argv from anything string-like
#[macro_export]
macro_rules! argv {
    ($($arg:expr),* $(,)?) => {
        vec![$($arg.to_string()),*]
    };
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records every argv; fails commands containing `fail_on`; emulates `git clone`
    /// by creating the target directory (plus `requirements.txt` if asked).
    #[derive(Default)]
    pub struct FakeRunner {
        pub calls: Mutex<Vec<Vec<String>>>,
        pub fail_on: Vec<String>,
        pub with_requirements: bool,
    }

    impl FakeRunner {
        pub fn failing_on(patterns: &[&str]) -> Self {
            Self {
                fail_on: patterns.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.join(" ")).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, argv: &[String]) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(argv.to_vec());
            let line = argv.join(" ");

            if self.fail_on.iter().any(|p| line.contains(p.as_str())) {
                return Ok(CommandOutput {
                    code: 1,
                    stdout: String::new(),
                    stderr: format!("fake failure: {}", line),
                });
            }

            if argv.get(1).map(String::as_str) == Some("clone") {
                if let Some(target) = argv.last() {
                    let dir = PathBuf::from(target);
                    std::fs::create_dir_all(&dir)?;
                    if self.with_requirements {
                        std::fs::write(dir.join("requirements.txt"), "requests\n")?;
                    }
                }
            }

            Ok(CommandOutput {
                code: 0,
                stdout: "ok".to_string(),
                stderr: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_process_runner_captures_output() {
        let output = ProcessRunner.run(&argv!["sh", "-c", "echo hello"]).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let output = ProcessRunner
            .run(&argv!["sh", "-c", "echo oops >&2; exit 3"])
            .await
            .unwrap();
        assert_eq!(output.code, 3);
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_process_runner_spawn_failure() {
        let result = ProcessRunner.run(&argv!["definitely-not-a-real-binary-xyz"]).await;
        assert!(matches!(result, Err(FleetError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_run_checked_non_zero_is_error() {
        let result = run_checked(&ProcessRunner, &argv!["sh", "-c", "exit 2"]).await;
        assert!(matches!(result, Err(FleetError::CommandFailed { code: 2, .. })));
    }
}
