use crate::core::RiskLevel;

mod device;

pub use device::{
    APPLE_DEVICE, ROUTER_GATEWAY, SMART_HOME_IOT, WORKSTATION, classify_device,
};

pub const GENERIC_REMEDIATION: &str = "Ensure service is patched and updated.";

const FTP_REMEDIATION: &str = "Disable FTP. Use SFTP (Port 22) or FTPS instead.";
const TELNET_REMEDIATION: &str = "CRITICAL: Disable immediately. Use SSH (Port 22).";
const REMOTE_DESKTOP_REMEDIATION: &str = "Place behind a VPN or restrict access via Firewall.";
const HTTP_REMEDIATION: &str = "Enforce HTTPS (Port 443) with a valid SSL certificate.";

/// Characters of joined vulnerability text kept in the info string.
pub const VULN_SUMMARY_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub risk: RiskLevel,
    pub info: String,
    pub remediation: String,
}

/// Classifies one open service. Pure; `vulnerabilities` is borrowed per call
/// so callers with no evidence pass `&[]`.
pub fn classify(
    port: u16,
    service: &str,
    product: &str,
    version: &str,
    vulnerabilities: &[String],
) -> Classification {
    let mut risk = RiskLevel::Low;
    let mut info = base_info(service, product, version);
    let mut remediation = GENERIC_REMEDIATION;

    if !vulnerabilities.is_empty() {
        risk = RiskLevel::High;
        info.push_str(&format!(
            " | {} VULNERABILITIES DETECTED: {}",
            vulnerabilities.len(),
            summarize_vulnerabilities(vulnerabilities)
        ));
    }

    // Port heuristics never override vulnerability evidence.
    if risk == RiskLevel::Low {
        match port {
            21 => {
                risk = RiskLevel::High;
                info.push_str(" (FTP Insecure)");
                remediation = FTP_REMEDIATION;
            }
            23 => {
                risk = RiskLevel::High;
                info.push_str(" (Telnet Unencrypted)");
                remediation = TELNET_REMEDIATION;
            }
            3389 | 5900 => {
                risk = RiskLevel::High;
                info.push_str(" (Remote Desktop Exposed)");
                remediation = REMOTE_DESKTOP_REMEDIATION;
            }
            80 | 8080 => {
                risk = RiskLevel::Medium;
                remediation = HTTP_REMEDIATION;
            }
            _ => {}
        }
    }

    Classification {
        risk,
        info,
        remediation: remediation.to_string(),
    }
}

fn base_info(service: &str, product: &str, version: &str) -> String {
    if product.is_empty() {
        return format!("Standard {service} service");
    }
    format!("{product} {version} ({service})").trim().to_string()
}

/// Joins evidence with `"; "`, keeps the first [`VULN_SUMMARY_CHARS`]
/// characters and always appends the ellipsis marker.
pub fn summarize_vulnerabilities(vulnerabilities: &[String]) -> String {
    let joined = vulnerabilities.join("; ");
    let mut out: String = joined.chars().take(VULN_SUMMARY_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unlisted_ports_are_low_with_generic_remediation() {
        for port in [22u16, 25, 53, 110, 443, 445, 3306, 8443, 65535, 0] {
            let c = classify(port, "svc", "", "", &[]);
            assert_eq!(c.risk, RiskLevel::Low, "port={port}");
            assert_eq!(c.remediation, GENERIC_REMEDIATION, "port={port}");
            assert_eq!(c.info, "Standard svc service");
        }
    }

    #[test]
    fn product_and_version_enrich_info() {
        let c = classify(22, "ssh", "OpenSSH", "8.9p1", &[]);
        assert_eq!(c.info, "OpenSSH 8.9p1 (ssh)");
    }

    #[test]
    fn missing_version_keeps_template_spacing() {
        let c = classify(22, "ssh", "OpenSSH", "", &[]);
        assert_eq!(c.info, "OpenSSH  (ssh)");

        let c = classify(22, "ssh", " ", "", &[]);
        assert_eq!(c.info, "(ssh)");
    }

    #[test]
    fn ftp_is_high() {
        let c = classify(21, "ftp", "", "", &[]);
        assert_eq!(c.risk, RiskLevel::High);
        assert!(c.info.ends_with("(FTP Insecure)"), "info={}", c.info);
        assert!(c.remediation.contains("SFTP"));
    }

    #[test]
    fn telnet_and_remote_desktop_are_high() {
        let c = classify(23, "telnet", "", "", &[]);
        assert_eq!(c.risk, RiskLevel::High);
        assert!(c.info.ends_with("(Telnet Unencrypted)"));
        assert!(c.remediation.contains("SSH"));

        for port in [3389u16, 5900] {
            let c = classify(port, "rdp", "", "", &[]);
            assert_eq!(c.risk, RiskLevel::High);
            assert!(c.info.ends_with("(Remote Desktop Exposed)"));
            assert!(c.remediation.contains("VPN"));
        }
    }

    #[test]
    fn plain_http_is_medium() {
        for port in [80u16, 8080] {
            let c = classify(port, "http", "", "", &[]);
            assert_eq!(c.risk, RiskLevel::Medium);
            assert_eq!(c.info, "Standard http service");
            assert!(c.remediation.contains("HTTPS"));
        }
    }

    #[test]
    fn vulnerability_evidence_forces_high() {
        let c = classify(443, "https", "", "", &evidence(&["[cve-x] remote code exec"]));
        assert_eq!(c.risk, RiskLevel::High);
        assert!(c.info.contains("1 VULNERABILITIES DETECTED"));
        assert_eq!(
            c.info,
            "Standard https service | 1 VULNERABILITIES DETECTED: [cve-x] remote code exec..."
        );
        assert_eq!(c.remediation, GENERIC_REMEDIATION);
    }

    #[test]
    fn vulnerability_evidence_skips_port_heuristics() {
        let c = classify(21, "ftp", "vsftpd", "2.3.4", &evidence(&["[a] x", "[b] y"]));
        assert_eq!(c.risk, RiskLevel::High);
        assert!(!c.info.contains("(FTP Insecure)"));
        assert!(c.info.starts_with("vsftpd 2.3.4 (ftp) | 2 VULNERABILITIES DETECTED: "));
        assert_eq!(c.remediation, GENERIC_REMEDIATION);

        let c = classify(80, "http", "", "", &evidence(&["[a] x"]));
        assert_eq!(c.risk, RiskLevel::High);
    }

    #[test]
    fn summary_truncates_to_200_chars_then_appends_marker() {
        let long = "a".repeat(150);
        let items = vec![long.clone(), long];
        let summary = summarize_vulnerabilities(&items);
        assert_eq!(summary.chars().count(), VULN_SUMMARY_CHARS + ELLIPSIS.len());
        assert!(summary.ends_with("..."));
        assert_eq!(&summary[..150], "a".repeat(150));
        assert_eq!(&summary[150..152], "; ");
    }

    #[test]
    fn summary_marker_is_appended_even_when_short() {
        assert_eq!(summarize_vulnerabilities(&evidence(&["[a] x", "[b] y"])), "[a] x; [b] y...");
    }

    #[test]
    fn summary_never_splits_multibyte_characters() {
        let items = vec!["é".repeat(250)];
        let summary = summarize_vulnerabilities(&items);
        assert_eq!(summary.chars().count(), VULN_SUMMARY_CHARS + 3);
        assert!(summary.starts_with("éé"));
    }

    #[test]
    fn classify_is_idempotent() {
        let vulns = evidence(&["[vulners] CVE-2021-1234 9.8"]);
        let a = classify(8080, "http-proxy", "Squid", "4.13", &vulns);
        let b = classify(8080, "http-proxy", "Squid", "4.13", &vulns);
        assert_eq!(a, b);

        let first = classify(8080, "http", "", "", &[]);
        let _ = classify(8080, "http", "", "", &vulns);
        let again = classify(8080, "http", "", "", &[]);
        assert_eq!(first, again);
        assert_eq!(again.risk, RiskLevel::Medium);
    }
}
