//! Provisioning planner - pure selection of what a run must do
//!
//! Planning happens in two phases because the installed check needs a
//! config file: [`prerequisites`] is decided from the filesystem probe alone,
//! [`terminal`] once the database has been asked whether the site is
//! installed.

use std::fmt;
use std::path::PathBuf;

use super::probe::{BackupSource, FileSystemProbe};
use crate::site::InstallMode;

/// A step the provisioner may take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionAction {
    /// Nothing to install (terminal)
    Skip,
    /// Fetch the application source (prerequisite)
    Download,
    /// Write the application config file (prerequisite)
    WriteConfig,
    /// Import a database dump (terminal)
    RestoreBackup(PathBuf),
    /// Run the installer and optional extras (terminal)
    FreshInstall,
    /// Move an installed site to the target version (terminal)
    UpdateVersion(String),
}

impl ProvisionAction {
    /// Whether this action ends the decision chain
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Download | Self::WriteConfig)
    }
}

impl fmt::Display for ProvisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Download => f.write_str("download"),
            Self::WriteConfig => f.write_str("write config"),
            Self::RestoreBackup(path) => write!(f, "restore backup {}", path.display()),
            Self::FreshInstall => f.write_str("fresh install"),
            Self::UpdateVersion(target) => write!(f, "update to {target}"),
        }
    }
}

/// Prerequisites the filesystem probe calls for, in execution order
pub fn prerequisites(mode: InstallMode, probe: &FileSystemProbe) -> Vec<ProvisionAction> {
    if mode == InstallMode::None {
        return Vec::new();
    }

    let mut actions = Vec::new();
    if !probe.loader_present {
        actions.push(ProvisionAction::Download);
    }
    if !probe.config_present {
        actions.push(ProvisionAction::WriteConfig);
    }
    actions
}

/// The single terminal action for this run
///
/// `backup` is only consulted when the site is not installed.
pub fn terminal(
    mode: InstallMode,
    probe: &FileSystemProbe,
    backup: Option<&BackupSource>,
    target_version: &str,
) -> ProvisionAction {
    if mode == InstallMode::None {
        return ProvisionAction::Skip;
    }

    if probe.installed {
        return ProvisionAction::UpdateVersion(target_version.to_string());
    }

    match backup {
        Some(source) => ProvisionAction::RestoreBackup(source.path().clone()),
        None => ProvisionAction::FreshInstall,
    }
}
