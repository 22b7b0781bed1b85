/// Counters for one ingestion phase
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PhaseStats {
    pub lines_read: u64,
    pub records_parsed: u64,
    pub lines_skipped: u64,
    pub empty_ids: u64,
    pub records_saved: u64,
    pub author_lookups: u64,
    pub unknown_authors: u64,
}

impl PhaseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_lines(&mut self) {
        self.lines_read += 1;
    }

    pub fn inc_parsed(&mut self) {
        self.records_parsed += 1;
    }

    pub fn inc_skipped(&mut self) {
        self.lines_skipped += 1;
    }

    pub fn inc_empty_ids(&mut self) {
        self.empty_ids += 1;
    }

    /// Every line read ends up either parsed or skipped
    pub fn is_balanced(&self) -> bool {
        self.lines_read == self.records_parsed + self.lines_skipped
    }
}

/// Outcome of a completed run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub authors: PhaseStats,
    pub works: PhaseStats,
}

impl IngestReport {
    pub fn total_skipped(&self) -> u64 {
        self.authors.lines_skipped + self.works.lines_skipped
    }

    pub fn total_saved(&self) -> u64 {
        self.authors.records_saved + self.works.records_saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = PhaseStats::new();
        assert_eq!(stats.lines_read, 0);
        assert_eq!(stats.records_parsed, 0);
        assert_eq!(stats.lines_skipped, 0);
        assert_eq!(stats.empty_ids, 0);
        assert_eq!(stats.records_saved, 0);
        assert!(stats.is_balanced());
    }

    #[test]
    fn counters_increment() {
        let mut stats = PhaseStats::new();
        stats.inc_lines();
        stats.inc_lines();
        stats.inc_lines();
        stats.inc_parsed();
        stats.inc_parsed();
        stats.inc_skipped();
        stats.inc_empty_ids();

        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.records_parsed, 2);
        assert_eq!(stats.lines_skipped, 1);
        assert_eq!(stats.empty_ids, 1);
        assert!(stats.is_balanced());
    }

    #[test]
    fn unbalanced_when_line_unaccounted() {
        let mut stats = PhaseStats::new();
        stats.inc_lines();
        assert!(!stats.is_balanced());
    }

    #[test]
    fn report_totals() {
        let report = IngestReport {
            authors: PhaseStats {
                lines_skipped: 2,
                records_saved: 10,
                ..Default::default()
            },
            works: PhaseStats {
                lines_skipped: 3,
                records_saved: 7,
                ..Default::default()
            },
        };
        assert_eq!(report.total_skipped(), 5);
        assert_eq!(report.total_saved(), 17);
    }
}
