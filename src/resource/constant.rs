//! Config-file constant resource

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::coerce::ConstantEntry;
use crate::tools::Wp;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};

/// A constant written into the site's config file
#[derive(Debug, Clone)]
pub struct WpConstant {
    dir: PathBuf,
    pub entry: ConstantEntry,
}

impl WpConstant {
    pub fn new(dir: &Path, entry: &ConstantEntry) -> Self {
        Self {
            dir: dir.to_path_buf(),
            entry: entry.clone(),
        }
    }
}

impl Resource for WpConstant {
    fn id(&self) -> String {
        format!("constant:{}", self.entry.key)
    }

    fn description(&self) -> String {
        let mode = if self.entry.is_raw() { "raw" } else { "quoted" };
        format!("Set {} = {} ({mode})", self.entry.key, self.entry.literal)
    }

    fn resource_type(&self) -> &'static str {
        "constant"
    }

    // Written every run; the config file is the only record of the value
    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(ResourceState::Unknown)
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.entry.literal.clone()),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Wp::new(ctx.exec, &self.dir)
            .config_set(&self.entry.key, &self.entry.literal, self.entry.is_raw())
            .with_context(|| format!("Failed to set {}", self.entry.key))?;
        Ok(ApplyResult::Modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge::{CommandExecutor, CommandOutput, ExecError, Invocation, execute_simple};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<Vec<String>>>,
        fail: bool,
    }

    impl CommandExecutor for Recording {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
            self.calls.borrow_mut().push(invocation.argv.clone());
            if self.fail {
                Ok(CommandOutput::failed(1, "Error: wp-config.php not found"))
            } else {
                Ok(CommandOutput::ok(""))
            }
        }
    }

    fn constant(key: &str, raw: &str) -> converge::BoxedResource {
        Box::new(WpConstant::new(Path::new("/site"), &ConstantEntry::new(key, raw)))
    }

    #[test]
    fn test_constants_are_always_written() {
        let exec = Recording::default();
        let mut ctx = ApplyContext::new(&exec);
        let resources: Vec<converge::BoxedResource> = vec![
            constant("WP_DEBUG_LOG", "true"),
            constant("WP_ENV", "local"),
            constant("WP_BIG_ID", "12345678901234567890"),
        ];

        let summary = execute_simple(&resources, &mut ctx);

        assert_eq!(summary.modified, 3);
        let calls = exec.calls.borrow();
        assert_eq!(calls[0], ["wp", "config", "set", "WP_DEBUG_LOG", "true", "--raw"]);
        assert_eq!(calls[1], ["wp", "config", "set", "WP_ENV", "local"]);
        assert_eq!(
            calls[2],
            ["wp", "config", "set", "WP_BIG_ID", "12345678901234567890", "--raw"]
        );
    }

    #[test]
    fn test_failure_names_constant() {
        let exec = Recording {
            fail: true,
            ..Default::default()
        };
        let mut ctx = ApplyContext::new(&exec);
        let resources: Vec<converge::BoxedResource> =
            vec![constant("WP_CACHE", "1")];

        let summary = execute_simple(&resources, &mut ctx);

        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].error.contains("Failed to set WP_CACHE"));
        assert!(summary.failures[0].error.contains("wp-config.php not found"));
    }
}
