//! Lock-free search statistics
//!
//! Process-wide counters for operational visibility. Nothing reads these
//! for control flow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::trademarks::SearchOutcome;

/// Global search statistics
#[derive(Debug)]
pub struct GlobalStats {
    searches: AtomicU64,
    successes: AtomicU64,
    empty: AtomicU64,
    failures: AtomicU64,
    records_extracted: AtomicU64,
    total_duration_ms: AtomicU64,
    start_time: AtomicU64,
}

impl GlobalStats {
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            searches: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            empty: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            records_extracted: AtomicU64::new(0),
            total_duration_ms: AtomicU64::new(0),
            start_time: AtomicU64::new(now),
        }
    }

    /// Record one completed workflow
    pub fn record_outcome(&self, outcome: &SearchOutcome, duration_ms: u64) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.total_duration_ms.fetch_add(duration_ms, Ordering::Relaxed);

        match outcome {
            SearchOutcome::Success(records) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                self.records_extracted
                    .fetch_add(records.len() as u64, Ordering::Relaxed);
            }
            SearchOutcome::NoResults => {
                self.empty.fetch_add(1, Ordering::Relaxed);
            }
            SearchOutcome::ValidationError(_)
            | SearchOutcome::Timeout
            | SearchOutcome::GenericFailure(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a workflow that never produced an outcome (queue-level failure)
    pub fn record_failure(&self, duration_ms: u64) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.total_duration_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// Average workflow duration in milliseconds
    pub fn average_duration_ms(&self) -> f64 {
        let searches = self.searches.load(Ordering::Relaxed);
        if searches == 0 {
            return 0.0;
        }
        self.total_duration_ms.load(Ordering::Relaxed) as f64 / searches as f64
    }

    /// Get snapshot for serialization
    pub fn snapshot(&self) -> GlobalStatsSnapshot {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        GlobalStatsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            records_extracted: self.records_extracted.load(Ordering::Relaxed),
            average_duration_ms: self.average_duration_ms(),
            uptime_secs: now.saturating_sub(self.start_time.load(Ordering::Relaxed)),
        }
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable statistics snapshot
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatsSnapshot {
    pub searches: u64,
    pub successes: u64,
    pub empty: u64,
    pub failures: u64,
    pub records_extracted: u64,
    pub average_duration_ms: f64,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trademarks::Trademark;

    fn record(id: &str) -> Trademark {
        Trademark {
            id: id.into(),
            status: String::new(),
            mark_text: String::new(),
            file_date: String::new(),
            classes: String::new(),
        }
    }

    #[test]
    fn outcomes_land_in_their_counters() {
        let stats = GlobalStats::new();

        stats.record_outcome(
            &SearchOutcome::Success(vec![record("a"), record("b")]),
            100,
        );
        stats.record_outcome(&SearchOutcome::NoResults, 50);
        stats.record_outcome(&SearchOutcome::GenericFailure("boom".into()), 30);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.searches, 3);
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.empty, 1);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.records_extracted, 2);
        assert_eq!(snapshot.average_duration_ms, 60.0);
    }

    #[test]
    fn empty_stats_average_is_zero() {
        let stats = GlobalStats::new();
        assert_eq!(stats.average_duration_ms(), 0.0);
    }
}
