//! Per-run statistics, printed by the CLI after every ingest.

use std::fmt;

/// Counters accumulated across one pipeline run. Every per-kind `run(..)`
/// function returns one of these; the CLI sums them across kinds when a
/// run covers more than one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    pub scraped: u64,
    pub parsed: u64,
    pub upserted: u64,
    pub skipped_existing: u64,
    pub skipped_recoverable: u64,
    pub aborted: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: RunStats) {
        self.scraped += other.scraped;
        self.parsed += other.parsed;
        self.upserted += other.upserted;
        self.skipped_existing += other.skipped_existing;
        self.skipped_recoverable += other.skipped_recoverable;
        self.aborted += other.aborted;
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scraped={} parsed={} upserted={} skipped_existing={} skipped_recoverable={} aborted={}",
            self.scraped, self.parsed, self.upserted, self.skipped_existing, self.skipped_recoverable, self.aborted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_every_counter() {
        let mut a = RunStats { scraped: 1, parsed: 1, upserted: 1, skipped_existing: 1, skipped_recoverable: 1, aborted: 0 };
        let b = RunStats { scraped: 2, parsed: 2, upserted: 2, skipped_existing: 2, skipped_recoverable: 2, aborted: 1 };
        a.merge(b);
        assert_eq!(a.scraped, 3);
        assert_eq!(a.aborted, 1);
    }
}
