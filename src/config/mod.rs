use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub scan: ScanConfig,
    pub output: OutputConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    pub nmap_path: String,
    pub timeout_secs: u64,
    pub stealth: bool,
    pub deep: bool,
    pub extra_args: Vec<String>,
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                nmap_path: "nmap".to_string(),
                timeout_secs: 900,
                stealth: false,
                deep: false,
                extra_args: Vec::new(),
            },
            output: OutputConfig { pretty: false },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    scan: Option<RawScanConfig>,
    output: Option<RawOutputConfig>,
}

#[derive(Debug, Deserialize)]
struct RawScanConfig {
    nmap_path: Option<String>,
    timeout_secs: Option<u64>,
    stealth: Option<bool>,
    deep: Option<bool>,
    extra_args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawOutputConfig {
    pretty: Option<bool>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/portrisk/config.toml")
}

/// Defaults, then the TOML file (explicit path or the default location under
/// `home_dir`), then `PORTRISK_*` environment overrides.
pub fn load(config_path: Option<&Path>, home_dir: Option<&Path>) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .or_else(|| home_dir.map(default_config_path));

    if let Some(path) = path {
        if path.exists() {
            let s = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            apply_toml(&mut cfg, &s)
                .with_context(|| format!("failed to parse config file: {}", path.display()))?;
            cfg.config_path = Some(path.display().to_string());
        } else if config_path.is_some() {
            return Err(anyhow::anyhow!(
                "config file not found: {}",
                path.display()
            ));
        }
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_toml(cfg: &mut EffectiveConfig, s: &str) -> Result<()> {
    let raw: RawConfig = toml::from_str(s).context("invalid TOML")?;
    apply_raw_config(cfg, raw);
    Ok(())
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(scan) = raw.scan {
        if let Some(nmap_path) = scan.nmap_path {
            cfg.scan.nmap_path = nmap_path;
        }
        if let Some(timeout_secs) = scan.timeout_secs {
            cfg.scan.timeout_secs = timeout_secs;
        }
        if let Some(stealth) = scan.stealth {
            cfg.scan.stealth = stealth;
        }
        if let Some(deep) = scan.deep {
            cfg.scan.deep = deep;
        }
        if let Some(extra_args) = scan.extra_args {
            cfg.scan.extra_args = extra_args;
        }
    }

    if let Some(output) = raw.output {
        if let Some(pretty) = output.pretty {
            cfg.output.pretty = pretty;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("PORTRISK_NMAP_PATH") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.scan.nmap_path = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("PORTRISK_SCAN_TIMEOUT") {
        cfg.scan.timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "PORTRISK_SCAN_TIMEOUT")?;
    }
    if let Ok(v) = std::env::var("PORTRISK_SCAN_STEALTH") {
        cfg.scan.stealth = parse_bool(&v).with_context(|| "PORTRISK_SCAN_STEALTH")?;
    }
    if let Ok(v) = std::env::var("PORTRISK_SCAN_DEEP") {
        cfg.scan.deep = parse_bool(&v).with_context(|| "PORTRISK_SCAN_DEEP")?;
    }
    if let Ok(v) = std::env::var("PORTRISK_SCAN_EXTRA_ARGS") {
        cfg.scan.extra_args = split_list(&v);
    }
    if let Ok(v) = std::env::var("PORTRISK_OUTPUT_PRETTY") {
        cfg.output.pretty = parse_bool(&v).with_context(|| "PORTRISK_OUTPUT_PRETTY")?;
    }

    Ok(())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}
