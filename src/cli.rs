use clap::Parser;
use std::path::PathBuf;

use crate::paths::{
    DEFAULT_BACKUPS_DIR, DEFAULT_CONFIG_PATH, ENV_BACKUPS_DIR, ENV_CONFIG, ENV_SANDBOX,
    ENV_SITE_NAME, ENV_SITE_PATH,
};

#[derive(Parser, Debug)]
#[command(name = "siteup")]
#[command(version)]
#[command(about = "Provision a single development site: database, source, config, install", long_about = None)]
pub struct Cli {
    /// Site identifier, as keyed in the config store
    #[arg(long, env = ENV_SITE_NAME)]
    pub site: String,

    /// Site root directory
    #[arg(long, env = ENV_SITE_PATH)]
    pub path: PathBuf,

    /// Site configuration store (YAML)
    #[arg(long, env = ENV_CONFIG, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Directory holding `<site>.sql` database dumps
    #[arg(long, env = ENV_BACKUPS_DIR, default_value = DEFAULT_BACKUPS_DIR)]
    pub backups_dir: String,

    /// Command prefix that drops privileges for site commands (empty to disable)
    #[arg(long, env = ENV_SANDBOX, default_value = "noroot")]
    pub sandbox: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "siteup",
            "--site",
            "blog",
            "--path",
            "/srv/www/blog",
            "--config",
            "/tmp/config.yml",
            "--sandbox",
            "",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.site, "blog");
        assert_eq!(cli.path, PathBuf::from("/srv/www/blog"));
        assert_eq!(cli.config, "/tmp/config.yml");
        assert_eq!(cli.sandbox, "");
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }
}
