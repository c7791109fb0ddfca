//! Optional extras run after a fresh install
//!
//! Every step here reports and continues: a failure is recorded in the
//! returned summary and the remaining steps still run. Steps that need the
//! output of a failed step are recorded as skipped.

use anyhow::{Context, Result};
use converge::{ApplyResult, CommandExecutor, ExecuteSummary, Invocation};
use std::collections::BTreeMap;
use std::path::Path;

use crate::cancel::Cancellation;
use crate::progress;
use crate::site::SiteConfig;
use crate::tools::Wp;
use crate::ui;

/// Plugins bundled with a fresh download
pub const DEFAULT_PLUGINS: &[&str] = &["akismet", "hello"];

/// Themes bundled with a fresh download
pub const DEFAULT_THEMES: &[&str] = &["twentytwentyone", "twentytwentytwo", "twentytwentythree"];

/// Theme unit test fixture
pub const TEST_CONTENT_URL: &str = "https://raw.githubusercontent.com/poststatus/wptest/master/wptest.xml";

pub const IMPORTER_PLUGIN: &str = "wordpress-importer";

/// Pages created by the bootstrap, in menu order
pub const BOOTSTRAP_PAGES: &[&str] = &["Home", "About", "Blog", "Contact"];
const FRONT_PAGE: &str = "Home";
const POSTS_PAGE: &str = "Blog";

pub const PRIMARY_MENU: &str = "Primary";
pub const MENU_LOCATION: &str = "primary";
pub const DEFAULT_CATEGORY: &str = "General";

/// Options every bootstrapped site gets before its own `site_options`
pub const STATIC_OPTIONS: &[(&str, &str)] = &[
    ("permalink_structure", "/%postname%/"),
    ("blog_public", "0"),
    ("default_comment_status", "closed"),
];

/// Records step outcomes, refusing new steps once cancelled
struct Recorder<'c> {
    cancel: &'c Cancellation,
    summary: ExecuteSummary,
}

impl<'c> Recorder<'c> {
    fn new(cancel: &'c Cancellation) -> Self {
        Self {
            cancel,
            summary: ExecuteSummary::default(),
        }
    }

    /// Run one step; returns whether it succeeded
    fn step(&mut self, id: &str, f: impl FnOnce() -> Result<ApplyResult>) -> bool {
        let result = if self.cancel.is_cancelled() {
            ApplyResult::Skipped {
                reason: "interrupted".to_string(),
            }
        } else {
            f().unwrap_or_else(|e| ApplyResult::Failed {
                error: format!("{e:#}"),
            })
        };
        self.report(id, result)
    }

    fn skip(&mut self, id: &str, reason: &str) {
        self.report(
            id,
            ApplyResult::Skipped {
                reason: reason.to_string(),
            },
        );
    }

    fn report(&mut self, id: &str, result: ApplyResult) -> bool {
        match &result {
            ApplyResult::NoChange => ui::dim(&format!("{id} (unchanged)")),
            ApplyResult::Skipped { reason } => ui::dim(&format!("{id} skipped: {reason}")),
            ApplyResult::Failed { error } => ui::warn(&format!("{id} failed: {error}")),
            _ => ui::success(id),
        }
        let ok = result.is_success() && !matches!(result, ApplyResult::Skipped { .. });
        self.summary.add_result(id, &result);
        ok
    }
}

/// Run the extras enabled in `config`
///
/// `wp` runs inside the sandbox; `host` fetches the test fixture, which is
/// written under the site root and removed afterwards whatever happens.
pub fn run(
    wp: &Wp,
    host: &dyn CommandExecutor,
    config: &SiteConfig,
    cancel: &Cancellation,
) -> ExecuteSummary {
    let mut rec = Recorder::new(cancel);
    let extras = &config.extras;

    if extras.delete_default_plugins {
        for name in DEFAULT_PLUGINS {
            rec.step(&format!("delete plugin {name}"), || {
                if !wp.plugin_is_installed(name)? {
                    return Ok(ApplyResult::NoChange);
                }
                wp.plugin_delete(name)?;
                Ok(ApplyResult::Removed)
            });
        }
    }

    if extras.delete_default_themes {
        for name in DEFAULT_THEMES {
            rec.step(&format!("delete theme {name}"), || {
                if !wp.theme_is_installed(name)? {
                    return Ok(ApplyResult::NoChange);
                }
                wp.theme_delete(name)?;
                Ok(ApplyResult::Removed)
            });
        }
    }

    if extras.install_test_content {
        rec.step("import test content", || {
            import_test_content(wp, host, config.layout.root())
        });
    }

    if extras.bootstrap {
        bootstrap_site(wp, config, &mut rec);
    }

    rec.summary
}

/// Download the fixture, install the importer, import
fn import_test_content(wp: &Wp, host: &dyn CommandExecutor, dir: &Path) -> Result<ApplyResult> {
    let fixture = tempfile::Builder::new()
        .prefix(".siteup-wptest-")
        .suffix(".xml")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create fixture file in {}", dir.display()))?;

    // The importer runs sandboxed and must be able to read the file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(fixture.path(), std::fs::Permissions::from_mode(0o644))
            .context("Failed to make fixture readable")?;
    }

    let path = fixture.path().display().to_string();
    host.run_checked(&Invocation::new([
        "curl",
        "-fsSL",
        "-o",
        path.as_str(),
        TEST_CONTENT_URL,
    ]))
    .context("Failed to download test content")?;

    wp.plugin_install(IMPORTER_PLUGIN, true, false)
        .context("Failed to install importer")?;
    progress::with_spinner("Importing test content", || wp.import(fixture.path()))
        .context("Failed to import test content")?;

    Ok(ApplyResult::Created)
}

/// Pages, front page, menu, default category and options
fn bootstrap_site(wp: &Wp, config: &SiteConfig, rec: &mut Recorder) {
    let mut pages: BTreeMap<String, u64> = BTreeMap::new();
    let pages_ok = rec.step("bootstrap pages", || {
        let (ids, created) = ensure_pages(wp)?;
        pages = ids;
        Ok(if created { ApplyResult::Created } else { ApplyResult::NoChange })
    });

    if pages_ok {
        rec.step("bootstrap front page", || {
            let front = page_id(&pages, FRONT_PAGE)?;
            let posts = page_id(&pages, POSTS_PAGE)?;
            wp.option_update("show_on_front", "page")?;
            wp.option_update("page_on_front", &front.to_string())?;
            wp.option_update("page_for_posts", &posts.to_string())?;
            Ok(ApplyResult::Modified)
        });
        rec.step("bootstrap menu", || ensure_menu(wp, &pages));
    } else {
        rec.skip("bootstrap front page", "pages unavailable");
        rec.skip("bootstrap menu", "pages unavailable");
    }

    rec.step("bootstrap default category", || {
        let existing = wp.list_terms("category")?;
        let (id, result) = match existing.iter().find(|t| t.name == DEFAULT_CATEGORY) {
            Some(term) => (term.term_id, ApplyResult::NoChange),
            None => (wp.create_term("category", DEFAULT_CATEGORY)?, ApplyResult::Created),
        };
        wp.option_update("default_category", &id.to_string())?;
        Ok(result)
    });

    let statics = STATIC_OPTIONS.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string()));
    let options = config.options.iter().map(|(k, v)| (k.clone(), v.clone()));
    for (key, value) in statics.chain(options) {
        rec.step(&format!("option {key}"), || {
            wp.option_update(&key, &value)?;
            Ok(ApplyResult::Modified)
        });
    }

    // Values stay out of ids and logs
    for (key, value) in &config.secrets {
        rec.step(&format!("secret option {key}"), || {
            wp.option_update(key, value)?;
            Ok(ApplyResult::Modified)
        });
    }
}

/// Page ids by title, creating missing pages; also reports whether any were created
fn ensure_pages(wp: &Wp) -> Result<(BTreeMap<String, u64>, bool)> {
    let existing = wp.list_pages()?;
    let mut ids = BTreeMap::new();
    let mut created = false;

    for title in BOOTSTRAP_PAGES {
        let id = match existing.iter().find(|p| p.post_title == *title) {
            Some(page) => page.id,
            None => {
                created = true;
                wp.create_page(title)?
            }
        };
        ids.insert((*title).to_string(), id);
    }
    Ok((ids, created))
}

fn page_id(pages: &BTreeMap<String, u64>, title: &str) -> Result<u64> {
    pages
        .get(title)
        .copied()
        .with_context(|| format!("page '{title}' missing"))
}

/// Primary menu with every bootstrap page, assigned to the primary location
fn ensure_menu(wp: &Wp, pages: &BTreeMap<String, u64>) -> Result<ApplyResult> {
    let (menu_id, mut result) = match wp.list_menus()?.iter().find(|m| m.name == PRIMARY_MENU) {
        Some(menu) => (menu.term_id, ApplyResult::NoChange),
        None => (wp.create_menu(PRIMARY_MENU)?, ApplyResult::Created),
    };

    let linked = wp.menu_post_ids(menu_id)?;
    for title in BOOTSTRAP_PAGES {
        let id = page_id(pages, title)?;
        if !linked.contains(&id) {
            wp.menu_add_post(menu_id, id)?;
            if result == ApplyResult::NoChange {
                result = ApplyResult::Modified;
            }
        }
    }

    wp.menu_assign_location(menu_id, MENU_LOCATION)?;
    Ok(result)
}
