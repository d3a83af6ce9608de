use crate::core::RiskLevel;
use serde::{Deserialize, Serialize};

/// One classified open port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub port: u16,
    pub service: String,
    pub product: String,
    pub version: String,
    pub risk: RiskLevel,
    pub info: String,
    pub remediation: String,
    pub cves: Vec<String>,
}
