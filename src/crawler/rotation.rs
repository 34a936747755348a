//! Credential rotation
//!
//! Credentials are consumed front to back. When the pool stops on a spent
//! credential the process restarts itself with the remaining credentials
//! and the same settings; the ledger and store carry progress across the
//! restart. Credentials travel in the environment, never in argv.

use crate::config::credential_fingerprint;
use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable carrying the comma-separated credential list
pub const CREDENTIALS_ENV: &str = "SNIPPET_HARVEST_TOKENS";

/// Ordered credentials, with a count of those already spent by earlier
/// process generations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialQueue {
    tokens: Vec<String>,
    spent: usize,
}

impl CredentialQueue {
    /// Creates a queue; an empty list is a configuration error
    pub fn new(tokens: Vec<String>, spent: usize) -> ConfigResult<Self> {
        if tokens.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(Self { tokens, spent })
    }

    /// The credential every worker of this generation uses
    pub fn current(&self) -> &str {
        &self.tokens[0]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }

    pub fn spent(&self) -> usize {
        self.spent
    }

    /// The remaining credentials as the value of [`CREDENTIALS_ENV`]
    pub fn to_env_value(&self) -> String {
        self.tokens.join(",")
    }

    /// One-based position of the current credential across all generations
    pub fn position(&self) -> usize {
        self.spent + 1
    }

    pub fn total(&self) -> usize {
        self.spent + self.tokens.len()
    }

    /// `position/total` followed by the current credential's fingerprint
    pub fn label(&self) -> String {
        format!(
            "{}/{} ({})",
            self.position(),
            self.total(),
            credential_fingerprint(self.current())
        )
    }

    /// Drops the current credential
    ///
    /// # Returns
    ///
    /// * `Some(CredentialQueue)` - The queue for the next generation
    /// * `None` - Every credential is spent
    pub fn rotate(mut self) -> Option<Self> {
        self.tokens.remove(0);
        if self.tokens.is_empty() {
            None
        } else {
            self.spent += 1;
            Some(self)
        }
    }
}

/// Settings a restarted process must inherit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartSettings {
    pub config_path: Option<PathBuf>,
    pub query: String,
    pub workers: usize,
    pub database_path: String,
    pub ledger_path: String,
    pub wrap_width: usize,
    pub log_file: Option<String>,
    pub verbose: u8,
    pub quiet: bool,
}

impl RestartSettings {
    /// Builds the argument list for the next generation
    ///
    /// Values are attached with `=` so ones starting with `-` are not read
    /// as flags. Credentials are not included, see [`restart_process`].
    pub fn to_args(&self, queue: &CredentialQueue) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(path) = &self.config_path {
            args.push(format!("--config={}", path.display()));
        }

        args.push(format!("--query={}", self.query));
        args.push(format!("--workers={}", self.workers));
        args.push(format!("--database={}", self.database_path));
        args.push(format!("--ledger={}", self.ledger_path));
        args.push(format!("--wrap-width={}", self.wrap_width));

        if let Some(log_file) = &self.log_file {
            args.push(format!("--log-file={}", log_file));
        }

        if self.verbose > 0 {
            args.push(format!("-{}", "v".repeat(self.verbose as usize)));
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }

        args.push(format!("--spent-credentials={}", queue.spent()));
        args
    }
}

/// Replaces the current process with `program args`, handing it the
/// queue's credentials through [`CREDENTIALS_ENV`]
///
/// On unix this only returns if `exec` failed. Elsewhere the child runs to
/// completion and its exit code is returned.
pub fn restart_process(
    program: &Path,
    args: &[String],
    queue: &CredentialQueue,
) -> std::io::Result<i32> {
    replace_process(restart_command(program, args, queue))
}

fn restart_command(program: &Path, args: &[String], queue: &CredentialQueue) -> Command {
    let mut command = Command::new(program);
    command.args(args).env(CREDENTIALS_ENV, queue.to_env_value());
    command
}

#[cfg(unix)]
fn replace_process(mut command: Command) -> std::io::Result<i32> {
    use std::os::unix::process::CommandExt;
    Err(command.exec())
}

#[cfg(not(unix))]
fn replace_process(mut command: Command) -> std::io::Result<i32> {
    let status = command.status()?;
    Ok(status.code().unwrap_or(1))
}
