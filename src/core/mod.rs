mod finding;
mod host;
mod report;
mod risk;
mod target;

pub use finding::Finding;
pub use host::{OsMatch, PortState, RawHostRecord, ScriptOutput};
pub use report::{AssessmentResult, HostReport, SCAN_FAILED_LABEL};
pub use risk::RiskLevel;
pub use target::ScanTarget;
