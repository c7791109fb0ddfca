//! Site filesystem layout and ambient path resolution
//!
//! A provisioned site lives under a single root directory:
//!
//! ```text
//! <root>/
//!   public_html/            installed source, wp-config.php, wp-content/database.sql
//!   log/                    nginx-error.log, nginx-access.log
//!   provision/              vvv-nginx-custom.conf, vvv-nginx-default.conf, vvv-nginx.conf
//!   wp-cli.yml
//! ```
//!
//! # Environment Variables
//!
//! - `VVV_SITE_NAME` - Site identifier
//! - `VVV_PATH_TO_SITE` - Site root directory
//! - `VVV_CONFIG` - Site configuration store (default `/vagrant/config.yml`)
//! - `VVV_DB_BACKUPS` - Host-global database backup directory (default `/srv/database/backups`)
//! - `SITEUP_SANDBOX` - Command prefix used to drop privileges (default `noroot`)

use std::path::{Path, PathBuf};

/// Environment variable carrying the site identifier
pub const ENV_SITE_NAME: &str = "VVV_SITE_NAME";

/// Environment variable carrying the site root
pub const ENV_SITE_PATH: &str = "VVV_PATH_TO_SITE";

/// Environment variable carrying the config store path
pub const ENV_CONFIG: &str = "VVV_CONFIG";

/// Environment variable overriding the global backup directory
pub const ENV_BACKUPS_DIR: &str = "VVV_DB_BACKUPS";

/// Environment variable overriding the sandbox wrapper
pub const ENV_SANDBOX: &str = "SITEUP_SANDBOX";

pub const DEFAULT_CONFIG_PATH: &str = "/vagrant/config.yml";
pub const DEFAULT_BACKUPS_DIR: &str = "/srv/database/backups";

/// Placeholder token substituted in nginx templates
pub const LIVE_URL_TOKEN: &str = "{{LIVE_URL}}";

/// Resolved on-disk layout of one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    root: PathBuf,
    public_dir: PathBuf,
    backups_dir: PathBuf,
}

impl SiteLayout {
    /// Build a layout; an empty `public_dir` serves the site from its root
    pub fn new(root: impl Into<PathBuf>, public_dir: &str, backups_dir: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let public_dir = if public_dir.is_empty() {
            root.clone()
        } else {
            root.join(public_dir)
        };
        Self {
            root,
            public_dir,
            backups_dir: backups_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the installed source and its config
    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Public dir relative to the root, as written to wp-cli.yml
    pub fn public_dir_relative(&self) -> &Path {
        self.public_dir
            .strip_prefix(&self.root)
            .unwrap_or(&self.public_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    pub fn error_log(&self) -> PathBuf {
        self.log_dir().join("nginx-error.log")
    }

    pub fn access_log(&self) -> PathBuf {
        self.log_dir().join("nginx-access.log")
    }

    pub fn provision_dir(&self) -> PathBuf {
        self.root.join("provision")
    }

    /// User-supplied nginx template, used verbatim when present
    pub fn custom_template(&self) -> PathBuf {
        self.provision_dir().join("vvv-nginx-custom.conf")
    }

    pub fn default_template(&self) -> PathBuf {
        self.provision_dir().join("vvv-nginx-default.conf")
    }

    /// Rendered nginx config picked up by the web server
    pub fn rendered_config(&self) -> PathBuf {
        self.provision_dir().join("vvv-nginx.conf")
    }

    /// File whose presence means the source has been downloaded
    pub fn loader_file(&self) -> PathBuf {
        self.public_dir.join("wp-load.php")
    }

    /// Site configuration file written by the config step
    pub fn config_file(&self) -> PathBuf {
        self.public_dir.join("wp-config.php")
    }

    /// Database dump shipped with the site itself
    pub fn local_dump(&self) -> PathBuf {
        self.public_dir.join("wp-content").join("database.sql")
    }

    /// Database dump kept by the host, keyed by site
    pub fn global_dump(&self, site_id: &str) -> PathBuf {
        self.backups_dir.join(format!("{site_id}.sql"))
    }

    pub fn wp_cli_config(&self) -> PathBuf {
        self.root.join("wp-cli.yml")
    }

    /// Advisory lock file guarding concurrent runs for a site
    pub fn lock_file(&self, site_id: &str) -> PathBuf {
        self.root.join(format!(".siteup-{site_id}.lock"))
    }
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
