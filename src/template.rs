//! nginx config rendering
//!
//! The site ships a default template (and optionally a custom override) in
//! its `provision/` directory. Rendering picks one, splices the live-URL
//! redirect block in place of [`LIVE_URL_TOKEN`], and the result replaces the
//! active config file in full.

use crate::error::{ProvisionError, Result};
use crate::paths::{LIVE_URL_TOKEN, SiteLayout};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Which template file a render used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Custom(PathBuf),
    Default(PathBuf),
}

impl TemplateSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Custom(p) | Self::Default(p) => p,
        }
    }
}

/// A rendered config ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub source: TemplateSource,
    pub text: String,
}

/// Pick the custom override if present, else the default template
pub fn select_template(layout: &SiteLayout) -> Result<TemplateSource> {
    let custom = layout.custom_template();
    if custom.is_file() {
        return Ok(TemplateSource::Custom(custom));
    }
    let default = layout.default_template();
    if default.is_file() {
        return Ok(TemplateSource::Default(default));
    }
    Err(ProvisionError::Template { custom, default })
}

/// Strip the scheme and trailing slashes from a live URL
pub fn normalize_live_host(live_url: &str) -> &str {
    let url = live_url.trim();
    let url = ["https://", "http://"]
        .iter()
        .find_map(|scheme| {
            url.get(..scheme.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
                .and_then(|_| url.get(scheme.len()..))
        })
        .unwrap_or(url);
    url.trim_end_matches('/')
}

/// The two nginx rules forwarding missing uploads to the live host
pub fn redirect_block(host: &str) -> String {
    format!(
        "if (!-e $request_filename) {{\n  \
           rewrite ^/[_0-9a-zA-Z-]+(/wp-content/uploads/.*) $1;\n\
         }}\n\
         if (!-e $request_filename) {{\n  \
           rewrite ^/wp-content/uploads/(.*)$ $scheme://{host}/wp-content/uploads/$1 redirect;\n\
         }}"
    )
}

/// Replace every `token` with `block`, line by line
///
/// Each line of a multi-line block is emitted on its own line, prefixed by
/// whatever preceded the token (usually indentation), and whatever followed
/// the token is kept after the block's last line. Original line endings are
/// preserved. An empty block simply removes the token.
pub fn splice(template: &str, token: &str, block: &str) -> String {
    let mut out = String::with_capacity(template.len() + block.len());

    for line in template.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        let Some(at) = body.find(token) else {
            out.push_str(line);
            continue;
        };

        let prefix = &body[..at];
        let rest = &body[at + token.len()..];
        // Further tokens on the same line are blanked
        let rest = rest.replace(token, "");

        let mut block_lines = block.split('\n').peekable();
        out.push_str(prefix);
        while let Some(block_line) = block_lines.next() {
            out.push_str(block_line);
            if block_lines.peek().is_some() {
                out.push_str(if ending.is_empty() { "\n" } else { ending });
                out.push_str(prefix);
            }
        }
        out.push_str(&rest);
        out.push_str(ending);
    }

    out
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Render the site's nginx config
///
/// A custom template is used verbatim apart from token substitution, exactly
/// like the default one.
pub fn render(layout: &SiteLayout, live_url: Option<&str>) -> Result<RenderedConfig> {
    let source = select_template(layout)?;
    let template = fs::read_to_string(source.path())
        .map_err(|e| ProvisionError::resource(source.path(), e))?;

    let block = match live_url {
        Some(url) => {
            let host = normalize_live_host(url);
            log::debug!("Live URL redirects point at {host}");
            redirect_block(host)
        }
        None => String::new(),
    };

    Ok(RenderedConfig {
        text: splice(&template, LIVE_URL_TOKEN, &block),
        source,
    })
}

/// Atomically replace `path` with `text`
///
/// Returns whether the content changed. The previous content, if any, is
/// diffed at debug level.
pub fn write_atomic(path: &Path, text: &str) -> Result<bool> {
    let dir = path
        .parent()
        .ok_or_else(|| ProvisionError::resource(path, "path has no parent directory"))?;

    let previous = fs::read_to_string(path).ok();
    if let Some(prev) = &previous {
        if prev != text && log::log_enabled!(log::Level::Debug) {
            let diff = similar::TextDiff::from_lines(prev.as_str(), text);
            log::debug!(
                "{} changed:\n{}",
                path.display(),
                diff.unified_diff().header("previous", "rendered")
            );
        }
    }

    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| ProvisionError::resource(dir, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ProvisionError::resource(tmp.path(), e))?;

    // Temp files are created 0600; sandboxed readers need the usual mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| ProvisionError::resource(tmp.path(), e))?;
    }

    tmp.persist(path)
        .map_err(|e| ProvisionError::resource(path, e.error))?;

    Ok(previous.as_deref() != Some(text))
}
