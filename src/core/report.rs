use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::core::Finding;

pub const SCAN_FAILED_LABEL: &str = "Scan Failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    pub ip: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub vulns: Vec<Finding>,
}

/// Result of one run. Serializes as a JSON array in every case, including
/// when the scan could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentResult {
    Hosts(Vec<HostReport>),
    Failed { error: String, ip: String },
}

impl AssessmentResult {
    pub fn empty() -> Self {
        AssessmentResult::Hosts(Vec::new())
    }

    pub fn failed(error: impl Into<String>, ip: impl Into<String>) -> Self {
        AssessmentResult::Failed {
            error: error.into(),
            ip: ip.into(),
        }
    }

    pub fn hosts(&self) -> &[HostReport] {
        match self {
            AssessmentResult::Hosts(hosts) => hosts,
            AssessmentResult::Failed { .. } => &[],
        }
    }
}

struct FailedHost<'a> {
    error: &'a str,
    ip: &'a str,
}

impl Serialize for FailedHost<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FailedHost", 4)?;
        s.serialize_field("error", self.error)?;
        s.serialize_field("ip", self.ip)?;
        s.serialize_field("type", SCAN_FAILED_LABEL)?;
        s.serialize_field("vulns", &[] as &[Finding])?;
        s.end()
    }
}

impl Serialize for AssessmentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AssessmentResult::Hosts(hosts) => serializer.collect_seq(hosts),
            AssessmentResult::Failed { error, ip } => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&FailedHost { error, ip })?;
                seq.end()
            }
        }
    }
}
