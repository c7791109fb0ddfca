//! Plugin resource

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::is_url;
use crate::tools::Wp;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};

/// An installed and active plugin, by slug or archive URL
#[derive(Debug, Clone)]
pub struct WpPlugin {
    dir: PathBuf,
    pub name: String,
}

impl WpPlugin {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
        }
    }
}

impl Resource for WpPlugin {
    fn id(&self) -> String {
        format!("plugin:{}", self.name)
    }

    fn description(&self) -> String {
        format!("Install and activate plugin {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "plugin"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if is_url(&self.name) {
            return Ok(ResourceState::Unknown);
        }

        let wp = Wp::new(ctx.exec, &self.dir);
        if !wp.plugin_is_installed(&self.name)? {
            return Ok(ResourceState::Absent);
        }
        if wp.plugin_is_active(&self.name)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Modified {
                from: "inactive".to_string(),
                to: "active".to_string(),
            })
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let wp = Wp::new(ctx.exec, &self.dir);

        if matches!(self.current_state(ctx)?, ResourceState::Modified { .. }) {
            wp.plugin_activate(&self.name)
                .with_context(|| format!("Failed to activate plugin {}", self.name))?;
            return Ok(ApplyResult::Modified);
        }

        wp.plugin_install(&self.name, true, is_url(&self.name))
            .with_context(|| format!("Failed to install plugin {}", self.name))?;
        Ok(ApplyResult::Created)
    }
}
