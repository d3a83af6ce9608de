use std::collections::BTreeSet;

use crate::classify::{classify, classify_device};
use crate::core::{AssessmentResult, Finding, HostReport, RawHostRecord, ScanTarget, ScriptOutput};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Command(#[from] crate::platform::CommandError),
    #[error("{cmd} exited with status {code}: {stderr}")]
    Exit {
        cmd: String,
        code: i32,
        stderr: String,
    },
    #[error("malformed scan output: {0}")]
    Malformed(String),
    #[error("{0}")]
    Other(String),
}

/// Something that can turn a target into per-host scan data.
pub trait ScanEngine {
    fn scan(&self, target: &ScanTarget) -> Result<Vec<RawHostRecord>, ScanError>;
}

/// Scans `target` and assesses every reported host. Never fails: an engine
/// error becomes the single-element degraded result.
pub fn run(target: &ScanTarget, engine: &dyn ScanEngine) -> AssessmentResult {
    if target.is_empty() {
        log::debug!("no target given; nothing to scan");
        return AssessmentResult::empty();
    }

    log::info!(
        "scanning {} (stealth={} deep={})",
        target.address,
        target.stealth,
        target.deep
    );
    let hosts = match engine.scan(target) {
        Ok(hosts) => hosts,
        Err(err) => {
            log::error!("scan of {} failed: {err}", target.address);
            return AssessmentResult::failed(err.to_string(), target.address.clone());
        }
    };

    let total = hosts.len();
    let reports: Vec<HostReport> = hosts.iter().filter_map(assess).collect();
    log::info!(
        "assessed {} host(s), skipped {} without port data",
        reports.len(),
        total - reports.len()
    );
    AssessmentResult::Hosts(reports)
}

/// Builds the report for one host, or `None` when the engine reported no
/// protocols for it.
pub fn assess(host: &RawHostRecord) -> Option<HostReport> {
    if host.protocols.is_empty() {
        log::debug!("{}: no protocols reported, skipping", host.ip);
        return None;
    }

    let mut open_ports = BTreeSet::new();
    let mut vulns = Vec::new();

    for (proto, ports) in &host.protocols {
        for (&port, state) in ports {
            if !state.is_open() {
                continue;
            }
            open_ports.insert(port);

            let product = state.product.clone().unwrap_or_default();
            let version = state.version.clone().unwrap_or_default();
            let cves = evidence_from_scripts(&state.scripts);
            let c = classify(port, &state.service, &product, &version, &cves);
            log::debug!("{}: {port}/{proto} {} -> {}", host.ip, state.service, c.risk);

            vulns.push(Finding {
                port,
                service: state.service.clone(),
                product,
                version,
                risk: c.risk,
                info: c.info,
                remediation: c.remediation,
                cves,
            });
        }
    }

    Some(HostReport {
        ip: host.ip.clone(),
        device_type: classify_device(host, &open_ports),
        vulns,
    })
}

pub fn evidence_from_scripts(scripts: &[ScriptOutput]) -> Vec<String> {
    scripts
        .iter()
        .map(|s| format!("[{}] {}", s.id, s.output.trim()))
        .collect()
}
