//! Observations of on-disk and in-database site state
//!
//! Probes are taken fresh every run; nothing here is cached between runs.

use crate::paths::SiteLayout;
use std::path::PathBuf;

/// What the pipeline found when it looked at the site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSystemProbe {
    /// `wp-load.php` exists in the public dir
    pub loader_present: bool,
    /// `wp-config.php` exists in the public dir
    pub config_present: bool,
    /// The database reports an installed site
    pub installed: bool,
}

impl FileSystemProbe {
    /// Look at the files; `installed` is left false until checked separately
    pub fn inspect(layout: &SiteLayout) -> Self {
        let probe = Self {
            loader_present: layout.loader_file().is_file(),
            config_present: layout.config_file().is_file(),
            installed: false,
        };
        log::debug!(
            "Probed {}: loader={} config={}",
            layout.public_dir().display(),
            probe.loader_present,
            probe.config_present
        );
        probe
    }

    pub fn with_installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }
}

/// Where a restorable database dump was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupSource {
    /// Dump shipped inside the site's content dir
    Local(PathBuf),
    /// Dump in the shared backups dir, named after the site
    Global(PathBuf),
}

impl BackupSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Local(p) | Self::Global(p) => p,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Global(_) => "global",
        }
    }
}

/// Find a dump to restore; the local dump wins over the global one
pub fn find_backup(layout: &SiteLayout, site_id: &str) -> Option<BackupSource> {
    let local = layout.local_dump();
    if local.is_file() {
        return Some(BackupSource::Local(local));
    }
    let global = layout.global_dump(site_id);
    if global.is_file() {
        return Some(BackupSource::Global(global));
    }
    None
}
