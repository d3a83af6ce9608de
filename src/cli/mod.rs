use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;

use crate::core::{AssessmentResult, ScanTarget};
use crate::engine;
use crate::nmap::NmapEngine;

#[derive(Debug, Parser)]
#[command(
    name = "portrisk",
    version,
    about = "Scan a host or network with nmap and classify the risk of every open service"
)]
pub struct Cli {
    /// IP address, hostname, or range understood by nmap. Empty prints `[]`.
    pub target: Option<String>,
    /// "true" (case-insensitive) for evasive timing; anything else scans fast.
    pub stealth: Option<String>,
    /// Also run nmap's `vuln` script category.
    #[arg(long)]
    pub deep: bool,
    #[arg(long)]
    pub timeout: Option<u64>,
    #[arg(long)]
    pub nmap: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub pretty: bool,
    #[arg(long)]
    pub show_config: bool,
    #[arg(long)]
    pub verbose: bool,
    #[arg(long)]
    pub quiet: bool,
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            return Ok(());
        }
        Err(err) => {
            init_logging(false, false);
            let msg = first_line(&err.to_string());
            log::error!("{msg}");
            return write_json(&AssessmentResult::failed(msg, ""), false);
        }
    };

    init_logging(cli.verbose, cli.quiet);

    let address = cli.target.clone().unwrap_or_default();
    if address.trim().is_empty() && !cli.show_config {
        log::debug!("no target given; nothing to scan");
        return write_json(&AssessmentResult::empty(), cli.pretty);
    }

    if let Some(user) = crate::platform::invoking_user() {
        log::debug!(
            "running under sudo for uid={} ({})",
            user.uid,
            user.username.as_deref().unwrap_or("unknown")
        );
    }
    let home_dir = crate::platform::effective_home_dir();
    let env_config_path = std::env::var_os("PORTRISK_CONFIG").map(PathBuf::from);
    let cfg = match crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        home_dir.as_deref(),
    ) {
        Ok(cfg) => cfg,
        Err(err) => {
            log::error!("{err:#}");
            return write_json(&AssessmentResult::failed(format!("{err:#}"), address), cli.pretty);
        }
    };

    if cli.show_config {
        return write_json(&cfg, true);
    }

    let stealth = cli
        .stealth
        .as_deref()
        .map(ScanTarget::stealth_from_arg)
        .unwrap_or(cfg.scan.stealth);
    let target = ScanTarget::new(address, stealth).with_deep(cli.deep || cfg.scan.deep);

    let scanner = NmapEngine {
        binary: cli
            .nmap
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| cfg.scan.nmap_path.clone()),
        timeout: cli
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| cfg.scan.timeout()),
        extra_args: cfg.scan.extra_args.clone(),
        show_progress: io::stderr().is_terminal() && !cli.quiet,
    };

    let result = engine::run(&target, &scanner);
    write_json(&result, cli.pretty || cfg.output.pretty)
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn first_line(s: &str) -> String {
    let line = s.lines().next().unwrap_or("").trim();
    line.strip_prefix("error:").unwrap_or(line).trim().to_string()
}

fn write_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let buf = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    let mut stdout = io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}
