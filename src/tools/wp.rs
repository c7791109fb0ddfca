//! The content manager CLI (`wp`)

use converge::{CommandExecutor, ExecError, Invocation};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::site::{AdminCredentials, DbSettings};

/// Extra PHP appended to a freshly written config file
pub const DEBUG_EXTRA_PHP: &str = "define( 'WP_DEBUG', true );\ndefine( 'SCRIPT_DEBUG', true );\n";

/// A page as listed by `wp post list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(rename = "ID")]
    pub id: u64,
    pub post_title: String,
}

/// A taxonomy term or menu as listed by `wp term list` / `wp menu list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Term {
    pub term_id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct MenuItem {
    object_id: serde_json::Value,
}

/// Site-bound `wp` invocations
pub struct Wp<'a> {
    exec: &'a dyn CommandExecutor,
    dir: PathBuf,
}

impl<'a> Wp<'a> {
    /// Bind to the site's public directory
    pub fn new(exec: &'a dyn CommandExecutor, dir: &Path) -> Self {
        Self {
            exec,
            dir: dir.to_path_buf(),
        }
    }

    fn cmd<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec!["wp".to_string()];
        argv.extend(args.into_iter().map(Into::into));
        Invocation::new(argv).cwd(&self.dir)
    }

    fn run<I, S>(&self, args: I) -> Result<(), ExecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exec.run_checked(&self.cmd(args)).map(drop)
    }

    fn capture<I, S>(&self, args: I) -> Result<String, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exec.run_capture(&self.cmd(args))
    }

    fn json<T, I, S>(&self, args: I) -> Result<T, ExecError>
    where
        T: serde::de::DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inv = self.cmd(args);
        let out = self.exec.run_capture(&inv)?;
        serde_json::from_str(&out).map_err(|e| ExecError::Failed {
            command: inv.display(),
            code: Some(1),
            stderr: format!("unexpected output: {e}"),
        })
    }

    fn porcelain_id<I, S>(&self, args: I) -> Result<u64, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inv = self.cmd(args);
        let out = self.exec.run_capture(&inv)?;
        out.parse().map_err(|_| ExecError::Failed {
            command: inv.display(),
            code: Some(1),
            stderr: format!("expected an id, got '{out}'"),
        })
    }

    // ========================================================================
    // Core
    // ========================================================================

    pub fn core_download(&self, version: &str, locale: &str) -> Result<(), ExecError> {
        self.run([
            "core".to_string(),
            "download".to_string(),
            format!("--locale={locale}"),
            format!("--version={version}"),
        ])
    }

    /// Write the config file; debug flags are always on
    pub fn core_config(&self, db: &DbSettings) -> Result<(), ExecError> {
        let inv = self
            .cmd([
                "core".to_string(),
                "config".to_string(),
                format!("--dbname={}", db.name),
                format!("--dbprefix={}", db.prefix),
                format!("--dbuser={}", db.user),
                format!("--dbpass={}", db.password),
                format!("--dbhost={}", db.host),
                "--extra-php".to_string(),
            ])
            .stdin(DEBUG_EXTRA_PHP);
        self.exec.run_checked(&inv).map(drop)
    }

    /// Whether the site is installed in its database
    pub fn is_installed(&self) -> Result<bool, ExecError> {
        self.exec.run_status(&self.cmd(["core", "is-installed"]))
    }

    pub fn core_version(&self) -> Result<String, ExecError> {
        self.capture(["core", "version"])
    }

    pub fn core_install(&self, url: &str, title: &str, admin: &AdminCredentials) -> Result<(), ExecError> {
        let mut args = vec!["core".to_string(), "install".to_string()];
        args.extend(install_args(url, title, admin));
        self.run(args)
    }

    pub fn multisite_install(
        &self,
        subdomains: bool,
        url: &str,
        title: &str,
        admin: &AdminCredentials,
    ) -> Result<(), ExecError> {
        let mut args = vec!["core".to_string(), "multisite-install".to_string()];
        if subdomains {
            args.push("--subdomains".to_string());
        }
        args.extend(install_args(url, title, admin));
        self.run(args)
    }

    /// Update core to `version`; `latest` means the newest release
    pub fn core_update(&self, version: &str, force: bool) -> Result<(), ExecError> {
        let mut args = vec!["core".to_string(), "update".to_string()];
        if version != "latest" {
            args.push(format!("--version={version}"));
        }
        if force {
            args.push("--force".to_string());
        }
        self.run(args)
    }

    // ========================================================================
    // Config and database
    // ========================================================================

    /// Set a config constant or variable, written unquoted when `raw`
    pub fn config_set(&self, key: &str, value: &str, raw: bool) -> Result<(), ExecError> {
        let mut args = vec![
            "config".to_string(),
            "set".to_string(),
            key.to_string(),
            value.to_string(),
        ];
        if raw {
            args.push("--raw".to_string());
        }
        self.run(args)
    }

    pub fn db_import(&self, dump: &Path) -> Result<(), ExecError> {
        self.run(["db".to_string(), "import".to_string(), dump.display().to_string()])
    }

    // ========================================================================
    // Plugins and themes
    // ========================================================================

    pub fn plugin_is_installed(&self, name: &str) -> Result<bool, ExecError> {
        self.exec.run_status(&self.cmd(["plugin", "is-installed", name]))
    }

    pub fn plugin_is_active(&self, name: &str) -> Result<bool, ExecError> {
        self.exec.run_status(&self.cmd(["plugin", "is-active", name]))
    }

    pub fn plugin_install(&self, name: &str, activate: bool, force: bool) -> Result<(), ExecError> {
        let mut args = vec!["plugin", "install", name];
        if activate {
            args.push("--activate");
        }
        if force {
            args.push("--force");
        }
        self.run(args)
    }

    pub fn plugin_activate(&self, name: &str) -> Result<(), ExecError> {
        self.run(["plugin", "activate", name])
    }

    pub fn plugin_delete(&self, name: &str) -> Result<(), ExecError> {
        self.run(["plugin", "delete", name])
    }

    pub fn theme_is_installed(&self, name: &str) -> Result<bool, ExecError> {
        self.exec.run_status(&self.cmd(["theme", "is-installed", name]))
    }

    pub fn theme_install(&self, name: &str, force: bool) -> Result<(), ExecError> {
        let mut args = vec!["theme", "install", name];
        if force {
            args.push("--force");
        }
        self.run(args)
    }

    pub fn theme_delete(&self, name: &str) -> Result<(), ExecError> {
        self.run(["theme", "delete", name])
    }

    /// Import a WXR fixture, creating its authors
    pub fn import(&self, file: &Path) -> Result<(), ExecError> {
        self.run([
            "import".to_string(),
            file.display().to_string(),
            "--authors=create".to_string(),
        ])
    }

    // ========================================================================
    // Content
    // ========================================================================

    pub fn list_pages(&self) -> Result<Vec<Page>, ExecError> {
        self.json([
            "post",
            "list",
            "--post_type=page",
            "--post_status=any",
            "--fields=ID,post_title",
            "--format=json",
        ])
    }

    /// Create a published page, returning its id
    pub fn create_page(&self, title: &str) -> Result<u64, ExecError> {
        self.porcelain_id([
            "post".to_string(),
            "create".to_string(),
            "--post_type=page".to_string(),
            "--post_status=publish".to_string(),
            format!("--post_title={title}"),
            "--porcelain".to_string(),
        ])
    }

    pub fn option_update(&self, key: &str, value: &str) -> Result<(), ExecError> {
        self.run(["option", "update", key, value])
    }

    pub fn list_menus(&self) -> Result<Vec<Term>, ExecError> {
        self.json(["menu", "list", "--fields=term_id,name", "--format=json"])
    }

    pub fn create_menu(&self, name: &str) -> Result<u64, ExecError> {
        self.porcelain_id(["menu", "create", name, "--porcelain"])
    }

    /// Post ids already linked from a menu
    pub fn menu_post_ids(&self, menu_id: u64) -> Result<Vec<u64>, ExecError> {
        let items: Vec<MenuItem> = self.json([
            "menu".to_string(),
            "item".to_string(),
            "list".to_string(),
            menu_id.to_string(),
            "--fields=object_id".to_string(),
            "--format=json".to_string(),
        ])?;
        Ok(items
            .iter()
            .filter_map(|item| match &item.object_id {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .collect())
    }

    pub fn menu_add_post(&self, menu_id: u64, post_id: u64) -> Result<(), ExecError> {
        self.run([
            "menu".to_string(),
            "item".to_string(),
            "add-post".to_string(),
            menu_id.to_string(),
            post_id.to_string(),
        ])
    }

    pub fn menu_assign_location(&self, menu_id: u64, location: &str) -> Result<(), ExecError> {
        self.run([
            "menu".to_string(),
            "location".to_string(),
            "assign".to_string(),
            menu_id.to_string(),
            location.to_string(),
        ])
    }

    pub fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>, ExecError> {
        self.json(["term", "list", taxonomy, "--fields=term_id,name", "--format=json"])
    }

    pub fn create_term(&self, taxonomy: &str, name: &str) -> Result<u64, ExecError> {
        self.porcelain_id(["term", "create", taxonomy, name, "--porcelain"])
    }
}

fn install_args(url: &str, title: &str, admin: &AdminCredentials) -> Vec<String> {
    vec![
        format!("--url={url}"),
        format!("--title={title}"),
        format!("--admin_user={}", admin.user),
        format!("--admin_email={}", admin.email),
        format!("--admin_password={}", admin.password),
    ]
}
