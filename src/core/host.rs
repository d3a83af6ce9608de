use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-host data as reported by the external scan engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHostRecord {
    pub ip: String,
    /// Ordered by descending accuracy.
    #[serde(default)]
    pub os_matches: Vec<OsMatch>,
    /// MAC address to vendor name.
    #[serde(default)]
    pub vendors: BTreeMap<String, String>,
    /// protocol -> port -> state
    #[serde(default)]
    pub protocols: BTreeMap<String, BTreeMap<u16, PortState>>,
}

impl RawHostRecord {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Self::default()
        }
    }

    pub fn best_os_name(&self) -> Option<&str> {
        self.os_matches
            .first()
            .and_then(|m| m.name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    pub fn primary_vendor(&self) -> Option<&str> {
        self.vendors
            .values()
            .next()
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsMatch {
    pub name: Option<String>,
    pub accuracy: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortState {
    pub state: String,
    pub service: String,
    pub product: Option<String>,
    pub version: Option<String>,
    /// In the order the engine reported them.
    #[serde(default)]
    pub scripts: Vec<ScriptOutput>,
}

impl PortState {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOutput {
    pub id: String,
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_os_name_ignores_blank_names() {
        let mut host = RawHostRecord::new("10.0.0.1");
        assert_eq!(host.best_os_name(), None);

        host.os_matches.push(OsMatch {
            name: Some("  ".to_string()),
            accuracy: 98,
        });
        assert_eq!(host.best_os_name(), None);

        host.os_matches[0].name = Some("Linux 5.x".to_string());
        assert_eq!(host.best_os_name(), Some("Linux 5.x"));
    }

    #[test]
    fn only_exact_open_state_counts() {
        let mut port = PortState {
            state: "open".to_string(),
            ..PortState::default()
        };
        assert!(port.is_open());
        port.state = "open|filtered".to_string();
        assert!(!port.is_open());
    }
}
