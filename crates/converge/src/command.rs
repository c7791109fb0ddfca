//! Command execution seam
//!
//! Every side effect a provisioner performs against an external tool goes
//! through [`CommandExecutor`]. Implementations decide how the process is
//! spawned (sandbox wrappers, environment); callers only see argv in and
//! stdout plus exit code out.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments
    pub argv: Vec<String>,
    /// Working directory, inherited when `None`
    pub cwd: Option<PathBuf>,
    /// Bytes fed to the child's stdin
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    /// Build an invocation from a program and its arguments
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            stdin: None,
        }
    }

    /// Run in the given working directory
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Feed the given bytes to stdin
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Working directory, if one was set
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Check whether argv starts with the given words
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.argv.len() >= prefix.len() && self.argv.iter().zip(prefix).all(|(a, p)| a == p)
    }

    /// Space-joined argv for logs and error messages
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    /// A successful output carrying the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            code: Some(0),
        }
    }

    /// A failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            code: Some(code),
        }
    }

    /// Zero exit is the only success signal
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Errors raised while running an external command
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be started at all
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited non-zero
    #[error("`{command}` exited with {}: {stderr}", .code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ExecError {
    /// Exit code to propagate to our own caller
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn { .. } => 127,
            Self::Failed { code, .. } => code.filter(|c| *c != 0).unwrap_or(1),
        }
    }
}

/// Runs external commands on behalf of provisioning steps
pub trait CommandExecutor {
    /// Run a command and capture its output; non-zero exit is not an error here
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;

    /// Run a command and return just success/failure
    fn run_status(&self, invocation: &Invocation) -> Result<bool, ExecError> {
        Ok(self.run(invocation)?.success())
    }

    /// Run a command, turning a non-zero exit into [`ExecError::Failed`]
    fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        let output = self.run(invocation)?;
        if !output.success() {
            return Err(ExecError::Failed {
                command: invocation.display(),
                code: output.code,
                stderr: output.stderr_str().trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Run a command and capture trimmed stdout
    fn run_capture(&self, invocation: &Invocation) -> Result<String, ExecError> {
        Ok(self.run_checked(invocation)?.stdout_str().trim().to_string())
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        (**self).run(invocation)
    }
}
