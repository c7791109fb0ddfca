//! Error types for site provisioning.
//!
//! Every fatal condition the pipeline can hit is one of these variants. Each
//! maps to a process exit code so the caller of `siteup` sees the same status
//! the failing tool reported.

use converge::ExecError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Site configuration could not be read or is unusable
    #[error("config error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// A required external command failed
    #[error("{step} failed: {source}")]
    Command {
        /// Pipeline step that issued the command
        step: &'static str,
        #[source]
        source: ExecError,
    },

    /// No nginx template could be found to render
    #[error("no nginx template found (looked for {} and {})", .custom.display(), .default.display())]
    Template {
        /// Custom override path that was checked
        custom: PathBuf,
        /// Default template path that was checked
        default: PathBuf,
    },

    /// A path on disk could not be created or written
    #[error("could not prepare {}: {message}", .path.display())]
    Resource {
        /// Path that failed
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Another run holds the site lock
    #[error("site '{site}' is already being provisioned (lock held on {})", .path.display())]
    Locked {
        /// Site identifier
        site: String,
        /// Lock file path
        path: PathBuf,
    },

    /// A termination signal arrived before an irreversible step
    #[error("cancelled before {step}")]
    Cancelled {
        /// Step that was not started
        step: &'static str,
    },
}

impl ProvisionError {
    /// Build a config error from any displayable message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build a resource error for a path
    pub fn resource(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Resource {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Wrap an executor error with the step that caused it
    pub fn command(step: &'static str, source: ExecError) -> Self {
        Self::Command { step, source }
    }

    /// Process exit code for this error.
    ///
    /// Command failures propagate the tool's own exit code; everything else
    /// exits with a fixed code per kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Command { source, .. } => u8::try_from(source.exit_code()).unwrap_or(1),
            Self::Cancelled { .. } => 130,
            Self::Config { .. } | Self::Template { .. } | Self::Resource { .. } => 1,
            Self::Locked { .. } => 75,
        }
    }
}

/// Result alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;
