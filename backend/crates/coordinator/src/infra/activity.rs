//! Miner Activity Windows
//!
//! Two sliding windows of miner identities: "active" (any work traffic) and
//! "interactive" (polling for work). Entries older than the window are
//! evicted by the reconciliation loop. The bot's last contact is tracked
//! separately for the liveness flag.

use crate::domain::value_objects::MinerId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Last-seen times of miners and the bot
#[derive(Debug)]
pub struct ActivityTracker {
    active: DashMap<MinerId, i64>,
    interactive: DashMap<MinerId, i64>,
    bot_last_seen_ms: AtomicI64,
}

impl ActivityTracker {
    /// Tracker whose bot was last seen at `now_ms`
    pub fn new(now_ms: i64) -> Self {
        Self {
            active: DashMap::new(),
            interactive: DashMap::new(),
            bot_last_seen_ms: AtomicI64::new(now_ms),
        }
    }

    /// Miner polled for work
    pub fn record_work_request(&self, miner: &MinerId, now_ms: i64) {
        self.active.insert(miner.clone(), now_ms);
        self.interactive.insert(miner.clone(), now_ms);
    }

    /// Any other miner traffic
    pub fn record_active(&self, miner: &MinerId, now_ms: i64) {
        self.active.insert(miner.clone(), now_ms);
    }

    pub fn record_bot(&self, now_ms: i64) {
        self.bot_last_seen_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Drop entries older than their window. Returns how many were dropped.
    ///
    /// Safe against concurrent recording: only removals are counted.
    pub fn evict(&self, now_ms: i64, active_window_ms: i64, interactive_window_ms: i64) -> usize {
        evict_older(&self.active, now_ms - active_window_ms)
            + evict_older(&self.interactive, now_ms - interactive_window_ms)
    }

    /// Miners in the active window
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Miners in the interactive window
    pub fn interactive_count(&self) -> usize {
        self.interactive.len()
    }

    pub fn bot_last_seen_ms(&self) -> i64 {
        self.bot_last_seen_ms.load(Ordering::SeqCst)
    }

    /// Whether the bot was heard from within `window_ms`
    pub fn bot_seen_within(&self, now_ms: i64, window_ms: i64) -> bool {
        now_ms - self.bot_last_seen_ms() <= window_ms
    }
}

/// Remove entries last seen before `cutoff_ms`, returning how many went
fn evict_older(window: &DashMap<MinerId, i64>, cutoff_ms: i64) -> usize {
    let mut evicted = 0;
    window.retain(|_, seen| {
        let keep = *seen >= cutoff_ms;
        if !keep {
            evicted += 1;
        }
        keep
    });
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_work_request_counts_in_both_windows() {
        let tracker = ActivityTracker::new(0);
        tracker.record_work_request(&MinerId::from("10.0.0.1"), 1_000);
        tracker.record_active(&MinerId::from("10.0.0.2"), 1_000);

        assert_eq!(tracker.active_count(), 2);
        assert_eq!(tracker.interactive_count(), 1);
    }

    #[test]
    fn test_evict_uses_separate_windows() {
        let tracker = ActivityTracker::new(0);
        tracker.record_work_request(&MinerId::from("10.0.0.1"), 0);

        // 40s later: outside the 30s window, inside the 5min one
        assert_eq!(tracker.evict(40_000, 300_000, 30_000), 1);
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.interactive_count(), 0);

        assert_eq!(tracker.evict(400_000, 300_000, 30_000), 1);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_evict_while_miners_keep_arriving() {
        let tracker = Arc::new(ActivityTracker::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let writer = {
            let tracker = tracker.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut n: u64 = 0;
                while !stop.load(Ordering::Relaxed) {
                    let miner = MinerId::from(format!("10.{}.{}.{}", n >> 16, (n >> 8) & 0xff, n & 0xff));
                    tracker.record_work_request(&miner, 1_000_000);
                    n += 1;
                }
                n
            })
        };

        let mut evicted = 0;
        for _ in 0..20_000 {
            evicted += tracker.evict(1_000_000, 300_000, 30_000);
        }
        stop.store(true, Ordering::Relaxed);
        let recorded = writer.join().unwrap();

        // fresh entries are never old enough to go
        assert_eq!(evicted, 0);
        assert_eq!(tracker.active_count() as u64, recorded);
        assert_eq!(tracker.interactive_count() as u64, recorded);

        // every entry lapses from both windows later
        let dropped = tracker.evict(2_000_000, 300_000, 30_000);
        assert_eq!(dropped as u64, recorded * 2);
    }

    #[test]
    fn test_bot_liveness() {
        let tracker = ActivityTracker::new(0);
        assert!(tracker.bot_seen_within(300_000, 300_000));
        assert!(!tracker.bot_seen_within(300_001, 300_000));

        tracker.record_bot(300_001);
        assert!(tracker.bot_seen_within(300_001, 300_000));
    }
}
