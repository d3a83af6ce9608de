/// What to scan and how. Built once from the command line and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub address: String,
    pub stealth: bool,
    pub deep: bool,
}

impl ScanTarget {
    pub fn new(address: impl Into<String>, stealth: bool) -> Self {
        Self {
            address: address.into(),
            stealth,
            deep: false,
        }
    }

    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.address.trim().is_empty()
    }

    /// Only a case-insensitive `"true"` selects evasive timing.
    pub fn stealth_from_arg(arg: &str) -> bool {
        arg.eq_ignore_ascii_case("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stealth_arg_only_accepts_true() {
        assert!(ScanTarget::stealth_from_arg("true"));
        assert!(ScanTarget::stealth_from_arg("TRUE"));
        assert!(ScanTarget::stealth_from_arg("True"));
        assert!(!ScanTarget::stealth_from_arg("false"));
        assert!(!ScanTarget::stealth_from_arg("yes"));
        assert!(!ScanTarget::stealth_from_arg("1"));
        assert!(!ScanTarget::stealth_from_arg(""));
    }

    #[test]
    fn blank_address_is_empty() {
        assert!(ScanTarget::new("", false).is_empty());
        assert!(ScanTarget::new("   ", true).is_empty());
        assert!(!ScanTarget::new("10.0.0.5", false).is_empty());
    }
}
