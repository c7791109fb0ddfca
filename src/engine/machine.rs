//! The provisioning driver
//!
//! One run walks a fixed sequence: database, log dirs, prerequisites, one
//! terminal action, then the steps that happen whatever the install mode
//! (nginx config and post-install resources). Required steps abort the run
//! with the failing command's error; optional ones land in the summary.

use converge::{ApplyContext, CommandExecutor, ExecuteSummary, Invocation};

use super::bootstrap;
use super::planner::{self, ProvisionAction};
use super::probe::{self, FileSystemProbe};
use super::version::{self, UpdateDirection};
use crate::cancel::Cancellation;
use crate::error::{ProvisionError, Result};
use crate::progress::{self, StatusLines};
use crate::resource;
use crate::site::{InstallMode, SiteConfig};
use crate::template::{self, TemplateSource};
use crate::tools::{Database, Wp, db};
use crate::ui;

/// What a completed run did
#[derive(Debug)]
pub struct RunReport {
    pub prerequisites: Vec<ProvisionAction>,
    pub terminal: ProvisionAction,
    pub template: TemplateSource,
    /// The rendered nginx config differs from the previous one
    pub nginx_changed: bool,
    /// Outcomes of every optional step
    pub optional: ExecuteSummary,
}

/// Drives one site through a provisioning run
pub struct Provisioner<'a> {
    config: &'a SiteConfig,
    /// Runs inside the sandbox: `wp` and site file preparation
    site: &'a dyn CommandExecutor,
    /// Runs on the host: database client and downloads
    host: &'a dyn CommandExecutor,
    cancel: Cancellation,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        config: &'a SiteConfig,
        site: &'a dyn CommandExecutor,
        host: &'a dyn CommandExecutor,
        cancel: Cancellation,
    ) -> Self {
        Self {
            config,
            site,
            host,
            cancel,
        }
    }

    fn wp(&self) -> Wp<'a> {
        Wp::new(self.site, self.config.layout.public_dir())
    }

    pub fn run(&self) -> Result<RunReport> {
        let mut optional = ExecuteSummary::default();

        let (prerequisites, terminal) = if self.config.install_mode == InstallMode::None {
            ui::info("Install mode is none, skipping database, download and install");
            let terminal = planner::terminal(
                InstallMode::None,
                &FileSystemProbe::default(),
                None,
                &self.config.version,
            );
            (Vec::new(), terminal)
        } else {
            self.provision(&mut optional)?
        };

        self.cancel.check("nginx config")?;
        let layout = &self.config.layout;
        let rendered = template::render(layout, self.config.live_url.as_deref())?;
        let nginx_changed = template::write_atomic(&layout.rendered_config(), &rendered.text)?;
        if nginx_changed {
            ui::success(&format!(
                "Wrote {} from {}",
                layout.rendered_config().display(),
                rendered.source.path().display()
            ));
        } else {
            ui::dim("nginx config unchanged");
        }

        let resources = resource::post_install(self.config);
        let mut ctx = ApplyContext::new(self.site).with_interrupt(self.cancel.flag());
        let post = converge::execute(
            "Constants, plugins and themes",
            &resources,
            &mut ctx,
            &mut StatusLines::default(),
        );
        optional.merge(&post);

        Ok(RunReport {
            prerequisites,
            terminal,
            template: rendered.source,
            nginx_changed,
            optional,
        })
    }

    /// Everything up to and including the terminal action
    fn provision(&self, optional: &mut ExecuteSummary) -> Result<(Vec<ProvisionAction>, ProvisionAction)> {
        let cfg = self.config;
        let wp = self.wp();

        self.ensure_database()?;
        self.ensure_log_dirs()?;
        self.write_cli_config()?;

        let probe = FileSystemProbe::inspect(&cfg.layout);
        let prerequisites = planner::prerequisites(cfg.install_mode, &probe);
        for action in &prerequisites {
            self.apply_prerequisite(&wp, action)?;
        }

        let installed = wp
            .is_installed()
            .map_err(|e| ProvisionError::command("installed check", e))?;
        let probe = probe.with_installed(installed);
        let backup = if installed {
            None
        } else {
            probe::find_backup(&cfg.layout, &cfg.site_id)
        };
        if let Some(source) = &backup {
            log::info!("Found {} backup {}", source.kind(), source.path().display());
        }

        let terminal = planner::terminal(cfg.install_mode, &probe, backup.as_ref(), &cfg.version);
        debug_assert!(terminal.is_terminal());
        log::info!("Terminal action: {terminal}");

        match &terminal {
            ProvisionAction::RestoreBackup(path) => self.restore(&wp, path)?,
            ProvisionAction::FreshInstall => {
                self.install(&wp)?;
                optional.merge(&bootstrap::run(&wp, self.host, cfg, &self.cancel));
            }
            ProvisionAction::UpdateVersion(target) => self.update(&wp, target)?,
            // Prerequisites are never terminal
            ProvisionAction::Skip | ProvisionAction::Download | ProvisionAction::WriteConfig => {}
        }

        Ok((prerequisites, terminal))
    }

    fn ensure_database(&self) -> Result<()> {
        self.cancel.check("database")?;
        let db = &self.config.db;
        let server = Database::new(self.host, db::ROOT_USER, db::ROOT_PASSWORD);

        server
            .create_database(&db.name)
            .and_then(|()| server.grant(db))
            .map_err(|e| ProvisionError::command("database", e))?;
        ui::success(&format!("Database {} ready for {}@{}", db.name, db.user, db.host));
        Ok(())
    }

    fn ensure_log_dirs(&self) -> Result<()> {
        self.cancel.check("log directories")?;
        let layout = &self.config.layout;
        let mkdir = Invocation::new([
            "mkdir".to_string(),
            "-p".to_string(),
            layout.log_dir().display().to_string(),
            layout.public_dir().display().to_string(),
        ]);
        let touch = Invocation::new([
            "touch".to_string(),
            layout.error_log().display().to_string(),
            layout.access_log().display().to_string(),
        ]);

        self.site
            .run_checked(&mkdir)
            .and_then(|_| self.site.run_checked(&touch))
            .map_err(|e| ProvisionError::command("log directories", e))?;
        Ok(())
    }

    /// Point `wp` at the public dir when run from the site root
    fn write_cli_config(&self) -> Result<()> {
        let layout = &self.config.layout;
        let relative = layout.public_dir_relative().display().to_string();
        let path = if relative.is_empty() { ".".to_string() } else { relative };
        template::write_atomic(&layout.wp_cli_config(), &format!("path: {path}\n"))?;
        Ok(())
    }

    fn apply_prerequisite(&self, wp: &Wp, action: &ProvisionAction) -> Result<()> {
        let cfg = self.config;
        match action {
            ProvisionAction::Download => {
                self.cancel.check("download")?;
                progress::with_spinner(
                    &format!("Downloading {} ({})", cfg.version, cfg.locale),
                    || wp.core_download(&cfg.version, &cfg.locale),
                )
                .map_err(|e| ProvisionError::command("download", e))
            }
            ProvisionAction::WriteConfig => {
                self.cancel.check("config")?;
                wp.core_config(&cfg.db)
                    .map_err(|e| ProvisionError::command("config", e))?;
                ui::success(&format!("Wrote {}", cfg.layout.config_file().display()));
                Ok(())
            }
            other => {
                log::debug!("Ignoring non-prerequisite action {other}");
                Ok(())
            }
        }
    }

    fn restore(&self, wp: &Wp, dump: &std::path::Path) -> Result<()> {
        self.cancel.check("restore")?;
        let db = &self.config.db;
        let settings = [
            ("DB_USER", &db.user),
            ("DB_PASSWORD", &db.password),
            ("DB_HOST", &db.host),
            ("DB_NAME", &db.name),
            ("table_prefix", &db.prefix),
        ];
        for (key, value) in settings {
            wp.config_set(key, value, false)
                .map_err(|e| ProvisionError::command("restore", e))?;
        }

        progress::with_spinner(&format!("Importing {}", dump.display()), || {
            wp.db_import(dump)
        })
        .map_err(|e| ProvisionError::command("restore", e))
    }

    fn install(&self, wp: &Wp) -> Result<()> {
        self.cancel.check("install")?;
        let cfg = self.config;
        let msg = format!("Installing {} ({})", cfg.domain, cfg.install_mode);

        progress::with_spinner(&msg, || {
            if cfg.install_mode.is_multisite() {
                wp.multisite_install(
                    cfg.install_mode == InstallMode::Subdomain,
                    &cfg.domain,
                    &cfg.title,
                    &cfg.admin,
                )
            } else {
                wp.core_install(&cfg.domain, &cfg.title, &cfg.admin)
            }
        })
        .map_err(|e| ProvisionError::command("install", e))
    }

    fn update(&self, wp: &Wp, target: &str) -> Result<()> {
        self.cancel.check("update")?;
        let current = wp
            .core_version()
            .map_err(|e| ProvisionError::command("update", e))?;

        let force = match version::direction(&current, target) {
            UpdateDirection::Current => {
                ui::success(&format!("Already at {current}"));
                return Ok(());
            }
            UpdateDirection::Forward => false,
            UpdateDirection::Downgrade => {
                ui::warn(&format!("Downgrading {current} to {target}"));
                true
            }
        };

        progress::with_spinner(&format!("Updating {current} to {target}"), || {
            wp.core_update(target, force)
        })
        .map_err(|e| ProvisionError::command("update", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{SiteEnv, resolve};
    use crate::store::YamlStore;
    use converge::{CommandOutput, ExecError};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str = "server {\n    server_name blog.test;\n    {{LIVE_URL}}\n}\n";

    /// Records invocations and answers by argv prefix; unmatched commands succeed
    #[derive(Default)]
    struct Scripted {
        rules: Vec<(Vec<&'static str>, CommandOutput)>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl Scripted {
        fn on(mut self, prefix: &[&'static str], output: CommandOutput) -> Self {
            self.rules.push((prefix.to_vec(), output));
            self
        }

        fn lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(Invocation::display).collect()
        }

        fn ran(&self, prefix: &[&str]) -> bool {
            self.calls.borrow().iter().any(|c| c.starts_with(prefix))
        }
    }

    impl CommandExecutor for Scripted {
        fn run(&self, inv: &Invocation) -> std::result::Result<CommandOutput, ExecError> {
            self.calls.borrow_mut().push(inv.clone());
            Ok(self
                .rules
                .iter()
                .find(|(prefix, _)| inv.starts_with(prefix))
                .map(|(_, out)| out.clone())
                .unwrap_or_else(|| CommandOutput::ok("")))
        }
    }

    fn not_installed() -> Scripted {
        Scripted::default().on(&["wp", "core", "is-installed"], CommandOutput::failed(1, ""))
    }

    fn site(custom: &str) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let yaml = format!("sites:\n  blog:\n    hosts: [blog.test]\n    custom:\n{custom}");
        let store = YamlStore::parse(&yaml).unwrap();
        let env = SiteEnv {
            site_root: dir.path().join("site"),
            backups_dir: dir.path().join("backups"),
            ..Default::default()
        };
        let cfg = resolve("blog", &store, &env).unwrap();
        fs::create_dir_all(cfg.layout.provision_dir()).unwrap();
        fs::write(cfg.layout.default_template(), TEMPLATE).unwrap();
        (dir, cfg)
    }

    #[test]
    fn test_fresh_single_install_end_to_end() {
        let (_dir, cfg) = site("      wp_type: single\n");
        let exec = not_installed();

        let report = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert_eq!(
            report.prerequisites,
            [ProvisionAction::Download, ProvisionAction::WriteConfig]
        );
        assert_eq!(report.terminal, ProvisionAction::FreshInstall);
        assert_eq!(report.optional.total(), 0);
        assert!(report.nginx_changed);

        let lines = exec.lines();
        assert!(lines[0].contains("CREATE DATABASE IF NOT EXISTS `blog`"));
        assert!(lines[1].contains("GRANT ALL PRIVILEGES"));
        assert!(lines[2].starts_with("mkdir -p "));
        assert!(lines[3].starts_with("touch "));
        assert_eq!(lines[4], "wp core download --locale=en_US --version=latest");
        assert!(lines[5].starts_with("wp core config --dbname=blog"));
        assert_eq!(lines[6], "wp core is-installed");
        assert!(lines[7].starts_with("wp core install --url=blog.test --title=blog.test"));
        assert_eq!(lines.len(), 8);

        let nginx = fs::read_to_string(cfg.layout.rendered_config()).unwrap();
        assert!(!nginx.contains("{{LIVE_URL}}"));
        assert!(!nginx.contains("rewrite"));

        let cli = fs::read_to_string(cfg.layout.wp_cli_config()).unwrap();
        assert_eq!(cli, "path: public_html\n");
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (_dir, cfg) = site("      wp_version: \"6.4\"\n");
        fs::create_dir_all(cfg.layout.public_dir()).unwrap();
        fs::write(cfg.layout.loader_file(), "").unwrap();
        fs::write(cfg.layout.config_file(), "").unwrap();
        let exec = Scripted::default().on(&["wp", "core", "version"], CommandOutput::ok("6.4\n"));

        let first = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();
        let second = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert!(first.prerequisites.is_empty());
        assert_eq!(second.terminal, ProvisionAction::UpdateVersion("6.4".into()));
        assert!(!second.nginx_changed);
        assert!(!exec.ran(&["wp", "core", "update"]));
        assert!(!exec.ran(&["wp", "core", "download"]));
        assert!(!exec.ran(&["wp", "core", "install"]));
    }

    #[test]
    fn test_installed_newer_site_is_downgraded() {
        let (_dir, cfg) = site("      wp_version: \"6.2\"\n");
        let exec = Scripted::default().on(&["wp", "core", "version"], CommandOutput::ok("6.4\n"));

        Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert!(exec.ran(&["wp", "core", "update", "--version=6.2", "--force"]));
    }

    #[test]
    fn test_installed_older_site_updates_forward() {
        let (_dir, cfg) = site("      wp_version: \"6.4\"\n");
        let exec = Scripted::default().on(&["wp", "core", "version"], CommandOutput::ok("6.2"));

        Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        let lines = exec.lines();
        assert!(lines.contains(&"wp core update --version=6.4".to_string()));
    }

    #[test]
    fn test_local_dump_restored_before_global() {
        let (_dir, cfg) = site("      db_prefix: blog_\n");
        fs::create_dir_all(cfg.layout.local_dump().parent().unwrap()).unwrap();
        fs::write(cfg.layout.local_dump(), "-- dump").unwrap();
        fs::create_dir_all(cfg.layout.global_dump("blog").parent().unwrap()).unwrap();
        fs::write(cfg.layout.global_dump("blog"), "-- dump").unwrap();
        let exec = not_installed();

        let report = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert_eq!(
            report.terminal,
            ProvisionAction::RestoreBackup(cfg.layout.local_dump())
        );
        let lines = exec.lines();
        assert!(lines.contains(&"wp config set table_prefix blog_".to_string()));
        assert!(lines.contains(&"wp config set DB_NAME blog".to_string()));
        assert!(lines.contains(&format!("wp db import {}", cfg.layout.local_dump().display())));
        assert!(!exec.ran(&["wp", "core", "install"]));
    }

    #[test]
    fn test_subdomain_multisite_install() {
        let (_dir, cfg) = site("      wp_type: subdomain\n");
        let exec = not_installed();

        Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert!(exec.ran(&["wp", "core", "multisite-install", "--subdomains"]));
    }

    #[test]
    fn test_none_mode_only_renders_and_converges() {
        let (_dir, cfg) = site(
            "      wp_type: none\n      live_url: https://example.com/\n      install_themes: [astra]\n",
        );
        let exec = Scripted::default().on(&["wp", "theme", "is-installed"], CommandOutput::failed(1, ""));

        let report = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert_eq!(report.terminal, ProvisionAction::Skip);
        assert!(!exec.ran(&["mysql"]));
        assert!(!exec.ran(&["wp", "core"]));
        assert!(exec.ran(&["wp", "theme", "install", "astra"]));
        assert_eq!(report.optional.created, 1);

        let nginx = fs::read_to_string(cfg.layout.rendered_config()).unwrap();
        assert!(nginx.contains("$scheme://example.com/wp-content/uploads/$1 redirect;"));
    }

    #[test]
    fn test_required_failure_aborts_with_tool_exit_code() {
        let (_dir, cfg) = site("      install_plugins: [query-monitor]\n");
        let exec = not_installed().on(
            &["wp", "core", "download"],
            CommandOutput::failed(4, "Error: network unreachable"),
        );

        let err = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert!(!exec.ran(&["wp", "core", "config"]));
        assert!(!exec.ran(&["wp", "plugin"]));
        assert!(!cfg.layout.rendered_config().exists());
    }

    #[test]
    fn test_optional_failures_are_aggregated() {
        let (_dir, cfg) = site(
            "      install_plugins: [broken, query-monitor]\n      wpconfig_constants:\n        WP_DEBUG_LOG: true\n",
        );
        let exec = Scripted::default()
            .on(&["wp", "core", "version"], CommandOutput::ok("6.4"))
            .on(&["wp", "plugin", "is-installed"], CommandOutput::failed(1, ""))
            .on(
                &["wp", "plugin", "install", "broken"],
                CommandOutput::failed(1, "Error: plugin not found"),
            );

        let report = Provisioner::new(&cfg, &exec, &exec, Cancellation::never())
            .run()
            .unwrap();

        assert_eq!(report.optional.failed, 1);
        assert_eq!(report.optional.failures[0].id, "plugin:broken");
        assert_eq!(report.optional.created, 1);
        assert_eq!(report.optional.modified, 1);
        assert!(exec.ran(&["wp", "config", "set", "WP_DEBUG_LOG", "true", "--raw"]));
    }

    #[test]
    fn test_cancelled_run_starts_nothing() {
        let (_dir, cfg) = site("");
        let exec = Scripted::default();
        let cancel = Cancellation::never();
        cancel.cancel();

        let err = Provisioner::new(&cfg, &exec, &exec, cancel).run().unwrap_err();

        assert!(matches!(err, ProvisionError::Cancelled { step: "database" }));
        assert_eq!(err.exit_code(), 130);
        assert!(exec.calls.borrow().is_empty());
    }
}
