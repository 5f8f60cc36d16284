//! Screening universe: roster entries and the inclusion policy data
//! sources apply before handing the roster to the pipeline.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub code: String,
    pub name: String,
}

impl RosterEntry {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// Which listings a data source offers for screening.
///
/// Codes must be six ASCII digits starting with `0` or `3` (Shenzhen) or
/// `6` (Shanghai); `8` (Beijing) is opt-in. Entries without a name are
/// dropped. Special-treatment names are kept so the pipeline can report them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterPolicy {
    pub include_bj: bool,
}

impl RosterPolicy {
    pub fn admits(&self, entry: &RosterEntry) -> bool {
        if entry.name.trim().is_empty() {
            return false;
        }
        let code = entry.code.as_str();
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match code.as_bytes()[0] {
            b'0' | b'3' | b'6' => true,
            b'8' => self.include_bj,
            _ => false,
        }
    }

    pub fn apply(&self, entries: Vec<RosterEntry>) -> Vec<RosterEntry> {
        entries.into_iter().filter(|e| self.admits(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_main_board_codes() {
        let policy = RosterPolicy::default();
        assert!(policy.admits(&RosterEntry::new("000001", "平安银行")));
        assert!(policy.admits(&RosterEntry::new("300750", "宁德时代")));
        assert!(policy.admits(&RosterEntry::new("600519", "贵州茅台")));
    }

    #[test]
    fn beijing_codes_are_opt_in() {
        let entry = RosterEntry::new("830799", "艾融软件");
        assert!(!RosterPolicy::default().admits(&entry));
        assert!(RosterPolicy { include_bj: true }.admits(&entry));
    }

    #[test]
    fn rejects_malformed_codes() {
        let policy = RosterPolicy { include_bj: true };
        assert!(!policy.admits(&RosterEntry::new("60051", "short")));
        assert!(!policy.admits(&RosterEntry::new("6005190", "long")));
        assert!(!policy.admits(&RosterEntry::new("60051A", "alpha")));
        assert!(!policy.admits(&RosterEntry::new("900901", "B share")));
    }

    #[test]
    fn rejects_blank_names() {
        assert!(!RosterPolicy::default().admits(&RosterEntry::new("600000", "  ")));
    }

    #[test]
    fn keeps_special_treatment_names() {
        assert!(RosterPolicy::default().admits(&RosterEntry::new("600000", "*ST测试")));
    }

    #[test]
    fn apply_preserves_order() {
        let entries = vec![
            RosterEntry::new("600519", "贵州茅台"),
            RosterEntry::new("900901", "B share"),
            RosterEntry::new("000001", "平安银行"),
        ];
        let kept = RosterPolicy::default().apply(entries);
        let codes: Vec<&str> = kept.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["600519", "000001"]);
    }
}
