//! CLI command execution helpers
//!
//! Wraps the `sitewatch` binary built for this test run. One-shot commands
//! run to completion; `watch` runs as a child whose stdout is read line by
//! line until the test has what it needs.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

/// CLI command builder
pub struct SitewatchCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl SitewatchCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_sitewatch")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env);
        command
    }

    /// Run to completion
    pub fn execute(&self) -> Result<CommandResult> {
        let output = self
            .command()
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }

    /// Start a long-running command with stdout streamed line by line
    pub fn spawn(&self) -> Result<RunningCommand> {
        let mut child = self
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn command")?;

        let stdout = child.stdout.take().context("Child has no stdout")?;
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(RunningCommand { child, lines })
    }
}

/// Command execution result
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

/// Child process started with [`SitewatchCommand::spawn`]
///
/// Killed on drop.
pub struct RunningCommand {
    child: Child,
    lines: Receiver<String>,
}

impl RunningCommand {
    /// Wait for a stdout line matching `pred`
    pub fn wait_for_line(&self, timeout: Duration, pred: impl Fn(&str) -> bool) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.lines.recv_timeout(remaining) {
                Ok(line) if pred(&line) => return Some(line),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}

impl Drop for RunningCommand {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// sitewatch!(dir, "config", "--example").assert_success()?;
/// ```
#[macro_export]
macro_rules! sitewatch {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::SitewatchCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
