use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{OsMatch, PortState, RawHostRecord, ScanTarget, ScriptOutput};
use crate::engine::{ScanEngine, ScanError};
use crate::platform;

const BASE_ARGS: &[&str] = &["-sV", "-O", "--version-light"];
// Slower timing, fragmented packets and random decoys.
const STEALTH_ARGS: &[&str] = &["-T2", "-f", "-D", "RND:5"];
const FAST_ARGS: &[&str] = &["-T4", "--max-retries", "1"];
const DEEP_ARGS: &[&str] = &["--script", "vuln"];

/// Full nmap argument list for `target`, ending with XML-on-stdout and the
/// address itself.
pub fn scan_arguments(target: &ScanTarget, extra_args: &[String]) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|s| s.to_string()).collect();
    let timing = if target.stealth { STEALTH_ARGS } else { FAST_ARGS };
    args.extend(timing.iter().map(|s| s.to_string()));
    if target.deep {
        args.extend(DEEP_ARGS.iter().map(|s| s.to_string()));
    }
    args.extend(extra_args.iter().cloned());
    args.push("-oX".to_string());
    args.push("-".to_string());
    args.push(target.address.trim().to_string());
    args
}

#[derive(Debug, Clone)]
pub struct NmapEngine {
    pub binary: String,
    pub timeout: Duration,
    pub extra_args: Vec<String>,
    pub show_progress: bool,
}

impl ScanEngine for NmapEngine {
    fn scan(&self, target: &ScanTarget) -> Result<Vec<RawHostRecord>, ScanError> {
        let args = scan_arguments(target, &self.extra_args);
        log::debug!("running {} {}", self.binary, args.join(" "));

        let pb = if self.show_progress {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.set_message(format!("scanning {}", target.address.trim()));
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let output = platform::run_command(&self.binary, &args, self.timeout);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        let output = output?;

        if output.exit_code != 0 {
            let stderr = output.stderr.trim();
            return Err(ScanError::Exit {
                cmd: self.binary.clone(),
                code: output.exit_code,
                stderr: if stderr.is_empty() {
                    "no error output".to_string()
                } else {
                    stderr.to_string()
                },
            });
        }
        if !output.stderr.trim().is_empty() {
            log::warn!("nmap: {}", output.stderr.trim());
        }

        parse_xml(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct XmlRun {
    #[serde(rename = "host", default)]
    hosts: Vec<XmlHost>,
}

#[derive(Debug, Deserialize)]
struct XmlHost {
    #[serde(rename = "address", default)]
    addresses: Vec<XmlAddress>,
    #[serde(default)]
    ports: Option<XmlPorts>,
    #[serde(default)]
    os: Option<XmlOs>,
}

#[derive(Debug, Deserialize)]
struct XmlAddress {
    #[serde(rename = "@addr")]
    addr: String,
    #[serde(rename = "@addrtype", default)]
    addr_type: String,
    #[serde(rename = "@vendor", default)]
    vendor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlPorts {
    #[serde(rename = "port", default)]
    ports: Vec<XmlPort>,
}

#[derive(Debug, Deserialize)]
struct XmlPort {
    #[serde(rename = "@protocol")]
    protocol: String,
    #[serde(rename = "@portid")]
    portid: u16,
    state: XmlState,
    #[serde(default)]
    service: Option<XmlService>,
    #[serde(rename = "script", default)]
    scripts: Vec<XmlScript>,
}

#[derive(Debug, Deserialize)]
struct XmlState {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct XmlService {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@product", default)]
    product: Option<String>,
    #[serde(rename = "@version", default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlScript {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@output", default)]
    output: String,
}

#[derive(Debug, Deserialize)]
struct XmlOs {
    #[serde(rename = "osmatch", default)]
    matches: Vec<XmlOsMatch>,
}

#[derive(Debug, Deserialize)]
struct XmlOsMatch {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@accuracy", default)]
    accuracy: Option<u8>,
}

/// Parses an nmap XML report (`-oX`) into per-host records, in report order.
pub fn parse_xml(xml: &str) -> Result<Vec<RawHostRecord>, ScanError> {
    if xml.trim().is_empty() {
        return Err(ScanError::Malformed("nmap produced no output".to_string()));
    }
    if !xml.contains("<nmaprun") {
        return Err(ScanError::Malformed(
            "output is not an nmap XML report".to_string(),
        ));
    }
    let run: XmlRun =
        quick_xml::de::from_str(xml).map_err(|e| ScanError::Malformed(e.to_string()))?;

    let mut out = Vec::with_capacity(run.hosts.len());
    for host in run.hosts {
        match host_record(host) {
            Some(record) => out.push(record),
            None => log::warn!("nmap reported a host without an IP address; ignoring it"),
        }
    }
    Ok(out)
}

fn host_record(host: XmlHost) -> Option<RawHostRecord> {
    let ip = pick_ip(&host.addresses)?;
    let mut record = RawHostRecord::new(ip);

    for addr in &host.addresses {
        if addr.addr_type != "mac" {
            continue;
        }
        if let Some(vendor) = addr.vendor.as_deref().filter(|v| !v.trim().is_empty()) {
            record.vendors.insert(addr.addr.clone(), vendor.to_string());
        }
    }

    if let Some(os) = host.os {
        record.os_matches = os
            .matches
            .into_iter()
            .map(|m| OsMatch {
                name: m.name,
                accuracy: m.accuracy.unwrap_or(0),
            })
            .collect();
        // Stable, so equal accuracies keep nmap's order.
        record
            .os_matches
            .sort_by_key(|m| std::cmp::Reverse(m.accuracy));
    }

    let mut protocols: BTreeMap<String, BTreeMap<u16, PortState>> = BTreeMap::new();
    for port in host.ports.map(|p| p.ports).unwrap_or_default() {
        let (service, product, version) = match port.service {
            Some(s) => (
                s.name.unwrap_or_default(),
                non_empty(s.product),
                non_empty(s.version),
            ),
            None => (String::new(), None, None),
        };
        let scripts = port
            .scripts
            .into_iter()
            .map(|s| ScriptOutput {
                id: s.id,
                output: s.output,
            })
            .collect();
        protocols.entry(port.protocol).or_default().insert(
            port.portid,
            PortState {
                state: port.state.state,
                service,
                product,
                version,
                scripts,
            },
        );
    }
    record.protocols = protocols;

    Some(record)
}

fn pick_ip(addresses: &[XmlAddress]) -> Option<String> {
    ["ipv4", "ipv6"]
        .iter()
        .find_map(|kind| addresses.iter().find(|a| a.addr_type == *kind))
        .map(|a| a.addr.clone())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}
