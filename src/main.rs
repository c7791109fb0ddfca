mod cancel;
mod cli;
mod coerce;
mod engine;
mod error;
mod lock;
mod paths;
mod progress;
mod resource;
mod runner;
mod site;
mod store;
mod template;
mod tools;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

use cancel::Cancellation;
use engine::{Provisioner, RunReport};
use error::ProvisionError;
use lock::SiteLock;
use runner::SystemExecutor;
use site::SiteEnv;
use store::YamlStore;

/// External tools the pipeline drives
const REQUIRED_TOOLS: &[&str] = &["wp", "mysql"];

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            let code = e
                .downcast_ref::<ProvisionError>()
                .map_or(1, ProvisionError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let store = YamlStore::load(&paths::expand(&cli.config))?;
    let env = SiteEnv::from_process(
        paths::expand(&cli.path.to_string_lossy()),
        paths::expand(&cli.backups_dir),
    );
    let config = site::resolve(&cli.site, &store, &env)?;

    if !cli.quiet {
        ui::header(&format!("Provisioning {}", config.domain));
        ui::kv("site", &config.site_id);
        ui::kv("path", &config.layout.root().display().to_string());
        ui::kv("mode", config.install_mode.as_str());
        ui::kv("version", &config.version);
        ui::kv("database", &config.db.name);
    }

    for tool in REQUIRED_TOOLS {
        if !runner::command_exists(tool) {
            ui::warn(&format!("{tool} not found on PATH; steps using it will fail"));
        }
    }

    let lock = SiteLock::acquire(&config.site_id, &config.layout.lock_file(&config.site_id))?;
    log::debug!("Holding {}", lock.path().display());
    let cancel = Cancellation::from_signals();

    let site_exec = SystemExecutor::new(&cli.sandbox);
    let host_exec = site_exec.unsandboxed();
    let report = Provisioner::new(&config, &site_exec, &host_exec, cancel)
        .run()
        .with_context(|| format!("Failed to provision {}", config.site_id))?;

    if !cli.quiet {
        print_report(&report);
    }
    ui::print_summary(&report.optional);
    ui::success(&format!(
        "{} provisioned ({}, {} optional changes)",
        config.domain,
        report.terminal,
        report.optional.total_changes()
    ));
    Ok(())
}

fn print_report(report: &RunReport) {
    ui::section("Run");
    let prerequisites = if report.prerequisites.is_empty() {
        "none".to_string()
    } else {
        report
            .prerequisites
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    ui::kv("prerequisites", &prerequisites);
    ui::kv("action", &report.terminal.to_string());
    let nginx = if report.nginx_changed { "updated" } else { "unchanged" };
    ui::kv("nginx", &format!("{nginx} from {}", report.template.path().display()));
}
