//! Post-install resources
//!
//! Constants, plugins and themes are converged after every run, whatever the
//! provisioning path was. Each is a [`converge::Resource`] so a failure is
//! recorded and the next item is still attempted.

mod constant;
mod plugin;
mod theme;

pub use constant::WpConstant;
pub use plugin::WpPlugin;
pub use theme::WpTheme;

use converge::BoxedResource;
use std::path::Path;

use crate::site::SiteConfig;

/// Entries given as URLs (zip archives) cannot be probed by slug
pub(crate) fn is_url(name: &str) -> bool {
    name.starts_with("http://") || name.starts_with("https://")
}

/// Build the post-install resources for a site, in application order
pub fn post_install(config: &SiteConfig) -> Vec<BoxedResource> {
    let dir: &Path = config.layout.public_dir();
    let mut resources: Vec<BoxedResource> = Vec::new();

    for entry in &config.constants {
        resources.push(Box::new(WpConstant::new(dir, entry)));
    }
    for name in &config.plugins {
        resources.push(Box::new(WpPlugin::new(dir, name)));
    }
    for name in &config.themes {
        resources.push(Box::new(WpTheme::new(dir, name)));
    }

    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{SiteEnv, resolve};
    use crate::store::YamlStore;
    use std::path::PathBuf;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/plugin.zip"));
        assert!(is_url("http://example.com/theme.zip"));
        assert!(!is_url("query-monitor"));
    }

    #[test]
    fn test_post_install_order() {
        let yaml = r"
sites:
  blog:
    custom:
      wpconfig_constants:
        WP_DEBUG_LOG: true
      install_plugins: [query-monitor, https://example.com/p.zip]
      install_themes: [astra]
";
        let store = YamlStore::parse(yaml).unwrap();
        let env = SiteEnv {
            site_root: PathBuf::from("/srv/www/blog"),
            ..Default::default()
        };
        let cfg = resolve("blog", &store, &env).unwrap();

        let ids: Vec<String> = post_install(&cfg).iter().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            [
                "constant:WP_DEBUG_LOG",
                "plugin:query-monitor",
                "plugin:https://example.com/p.zip",
                "theme:astra"
            ]
        );
    }
}
