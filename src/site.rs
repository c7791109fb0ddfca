//! Site configuration resolution
//!
//! [`resolve`] reads every setting the pipeline needs exactly once and hands
//! back an immutable [`SiteConfig`]. Nothing downstream looks at the store or
//! the environment again.

use crate::coerce::{ConstantEntry, coerce};
use crate::error::{ProvisionError, Result};
use crate::paths::SiteLayout;
use crate::store::ConfigStore;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Characters stripped from database names
pub const DB_NAME_FORBIDDEN: &[char] = &['\\', '/', '.', '<', '>', ':', '"', '\'', '|', '?', '!', '*'];

/// How the site is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Single,
    Subdomain,
    Subdirectory,
    /// Skip everything except the web-server config and post steps
    None,
}

impl InstallMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Subdomain => "subdomain",
            Self::Subdirectory => "subdirectory",
            Self::None => "none",
        }
    }

    pub fn is_multisite(&self) -> bool {
        matches!(self, Self::Subdomain | Self::Subdirectory)
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallMode {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "subdomain" => Ok(Self::Subdomain),
            "subdirectory" => Ok(Self::Subdirectory),
            "none" => Ok(Self::None),
            other => Err(ProvisionError::config(format!(
                "unknown wp_type '{other}' (expected single, subdomain, subdirectory or none)"
            ))),
        }
    }
}

/// Database connection settings for the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    /// Sanitized, never empty
    pub name: String,
    pub prefix: String,
    pub host: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
    pub email: String,
}

/// Optional post-install work, only run on a fresh install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallExtras {
    pub delete_default_plugins: bool,
    pub delete_default_themes: bool,
    pub install_test_content: bool,
    /// Run the extended bootstrap (pages, menu, options)
    pub bootstrap: bool,
}

/// Everything one provisioning run needs to know about its site
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_id: String,
    pub domain: String,
    pub title: String,
    /// Target version, or `latest`
    pub version: String,
    pub locale: String,
    pub install_mode: InstallMode,
    pub db: DbSettings,
    pub admin: AdminCredentials,
    pub plugins: Vec<String>,
    pub themes: Vec<String>,
    /// Canonical production URL for media redirects
    pub live_url: Option<String>,
    pub constants: Vec<ConstantEntry>,
    /// Site options applied by the bootstrap
    pub options: BTreeMap<String, String>,
    /// Secret site options resolved from the environment
    pub secrets: BTreeMap<String, String>,
    pub extras: InstallExtras,
    pub layout: SiteLayout,
}

/// Ambient inputs that do not come from the config store
#[derive(Debug, Clone, Default)]
pub struct SiteEnv {
    pub site_root: PathBuf,
    pub backups_dir: PathBuf,
    /// Environment variables visible to secret lookups
    pub vars: HashMap<String, String>,
}

impl SiteEnv {
    /// Capture the current process environment
    pub fn from_process(site_root: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            site_root,
            backups_dir,
            vars: std::env::vars().collect(),
        }
    }
}

/// Strip characters that are not allowed in a database name
pub fn sanitize_db_name(raw: &str) -> String {
    raw.chars().filter(|c| !DB_NAME_FORBIDDEN.contains(c)).collect()
}

/// Resolve the configuration of `site_id`
pub fn resolve(site_id: &str, store: &dyn ConfigStore, env: &SiteEnv) -> Result<SiteConfig> {
    let custom = |key: &str, default: &str| store.get_value(&["sites", site_id, "custom", key], default);
    let flag = |key: &str| coerce(&custom(key, "")).is_truthy();

    let domain = store
        .get_list(&["sites", site_id, "hosts"])
        .into_iter()
        .next()
        .unwrap_or_else(|| format!("{site_id}.test"));

    let db_name = sanitize_db_name(&custom("db_name", site_id));
    if db_name.is_empty() {
        return Err(ProvisionError::config(format!(
            "database name for site '{site_id}' is empty after removing forbidden characters"
        )));
    }

    let install_mode = custom("wp_type", "single").parse()?;

    let live_url = Some(custom("live_url", "")).filter(|u| !u.is_empty());

    let constants = store
        .get_values(&["sites", site_id, "custom", "wpconfig_constants"])
        .iter()
        .map(|(k, v)| ConstantEntry::new(k, v))
        .collect();

    let options = store
        .get_values(&["sites", site_id, "custom", "site_options"])
        .into_iter()
        .collect();

    let mut secrets = BTreeMap::new();
    for (option, var) in store.get_values(&["sites", site_id, "custom", "bootstrap_secrets"]) {
        match env.vars.get(&var).filter(|v| !v.is_empty()) {
            Some(value) => {
                secrets.insert(option, value.clone());
            }
            None => log::warn!("Secret for option '{option}' not set (expected ${var}), skipping"),
        }
    }

    let layout = SiteLayout::new(
        &env.site_root,
        &custom("public_dir", "public_html"),
        &env.backups_dir,
    );

    Ok(SiteConfig {
        site_id: site_id.to_string(),
        title: custom("site_title", &domain),
        domain,
        version: custom("wp_version", "latest"),
        locale: custom("locale", "en_US"),
        install_mode,
        db: DbSettings {
            name: db_name,
            prefix: custom("db_prefix", "wp_"),
            host: custom("db_host", "localhost"),
            user: custom("db_user", "wp"),
            password: custom("db_password", "wp"),
        },
        admin: AdminCredentials {
            user: custom("admin_user", "admin"),
            password: custom("admin_password", "password"),
            email: custom("admin_email", "admin@local.test"),
        },
        plugins: store.get_list(&["sites", site_id, "custom", "install_plugins"]),
        themes: store.get_list(&["sites", site_id, "custom", "install_themes"]),
        live_url,
        constants,
        options,
        secrets,
        extras: InstallExtras {
            delete_default_plugins: flag("delete_default_plugins"),
            delete_default_themes: flag("delete_default_themes"),
            install_test_content: flag("install_test_content"),
            bootstrap: flag("bootstrap"),
        },
        layout,
    })
}
