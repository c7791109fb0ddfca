//! Theme resource

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::is_url;
use crate::tools::Wp;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};

/// An installed theme, by slug or archive URL. Themes are never activated.
#[derive(Debug, Clone)]
pub struct WpTheme {
    dir: PathBuf,
    pub name: String,
}

impl WpTheme {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
        }
    }
}

impl Resource for WpTheme {
    fn id(&self) -> String {
        format!("theme:{}", self.name)
    }

    fn description(&self) -> String {
        format!("Install theme {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "theme"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if is_url(&self.name) {
            return Ok(ResourceState::Unknown);
        }
        if Wp::new(ctx.exec, &self.dir).theme_is_installed(&self.name)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Wp::new(ctx.exec, &self.dir)
            .theme_install(&self.name, is_url(&self.name))
            .with_context(|| format!("Failed to install theme {}", self.name))?;
        Ok(ApplyResult::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge::{BoxedResource, CommandExecutor, CommandOutput, ExecError, Invocation, execute_simple};
    use std::cell::RefCell;

    struct FakeSite {
        installed: bool,
        install_fails: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeSite {
        fn new(installed: bool, install_fails: bool) -> Self {
            Self {
                installed,
                install_fails,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandExecutor for FakeSite {
        fn run(&self, inv: &Invocation) -> Result<CommandOutput, ExecError> {
            self.calls.borrow_mut().push(inv.display());
            if inv.starts_with(&["wp", "theme", "is-installed"]) {
                return Ok(if self.installed {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(1, "")
                });
            }
            if self.install_fails {
                return Ok(CommandOutput::failed(1, "Error: theme not found"));
            }
            Ok(CommandOutput::ok(""))
        }
    }

    fn run(site: &FakeSite, name: &str) -> converge::ExecuteSummary {
        let resources: Vec<BoxedResource> = vec![Box::new(WpTheme::new(Path::new("/site"), name))];
        execute_simple(&resources, &mut ApplyContext::new(site))
    }

    #[test]
    fn test_installed_theme_is_skipped() {
        let site = FakeSite::new(true, false);
        assert_eq!(run(&site, "astra").no_change, 1);
        assert_eq!(site.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_theme_is_installed_without_activation() {
        let site = FakeSite::new(false, false);
        assert_eq!(run(&site, "astra").created, 1);
        assert_eq!(site.calls.borrow().last().unwrap(), "wp theme install astra");
    }

    #[test]
    fn test_url_theme_is_forced() {
        let site = FakeSite::new(false, false);
        run(&site, "https://example.com/t.zip");
        assert_eq!(
            *site.calls.borrow(),
            ["wp theme install https://example.com/t.zip --force"]
        );
    }

    #[test]
    fn test_install_failure_is_reported() {
        let site = FakeSite::new(false, true);
        let summary = run(&site, "nope");
        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].error.contains("theme not found"));
    }
}
