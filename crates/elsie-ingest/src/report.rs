use std::fmt;

/// Running tally of what happened to the titles handed to an `Ingestor` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub checked: u64,
    pub new: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub failed: u64,
}

impl IngestReport {
    pub fn merge(&mut self, other: IngestReport) {
        self.checked += other.checked;
        self.new += other.new;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked={} new={} updated={} unchanged={} failed={}",
            self.checked, self.new, self.updated, self.unchanged, self.failed
        )
    }
}
