// Shared result aggregation: bounded best/worst rankings plus cumulative
// per-lineup statistics keyed by identity hash.
//
// One `Aggregator` is shared by every worker through an `Arc`. Each ranking
// sits behind its own mutex; the statistics map is a `DashMap`, so updates
// to different lineups only contend when they land in the same shard.

use dashmap::DashMap;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::lineup::LineupResult;

/// Size of the worst-lineups ranking unless configured otherwise.
pub const DEFAULT_BOTTOM_K: usize = 10;

// ---------------------------------------------------------------------------
// Agg
// ---------------------------------------------------------------------------

/// Cumulative totals for one lineup identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Agg {
    pub games: u64,
    pub runs: u64,
    pub hits: u64,
}

impl Agg {
    pub fn mean_runs(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.runs as f64 / self.games as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking keys
// ---------------------------------------------------------------------------

/// A lineup result ordered by mean runs, ties broken by identity hash so the
/// ranking does not depend on the order results arrive in.
#[derive(Debug, Clone)]
pub struct RankedLineup(pub LineupResult);

impl PartialEq for RankedLineup {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedLineup {}

impl PartialOrd for RankedLineup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedLineup {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .mean_runs
            .total_cmp(&other.0.mean_runs)
            .then_with(|| self.0.hash.cmp(&other.0.hash))
    }
}

// ---------------------------------------------------------------------------
// BoundedRanking
// ---------------------------------------------------------------------------

/// Keeps the `capacity` smallest keys offered so far.
///
/// The heap root is the largest kept key, i.e. the next one to evict. Wrap
/// keys in `Reverse` to keep the largest instead.
#[derive(Debug, Clone)]
pub struct BoundedRanking<K: Ord> {
    capacity: usize,
    heap: BinaryHeap<K>,
}

impl<K: Ord> BoundedRanking<K> {
    pub fn new(capacity: usize) -> Self {
        BoundedRanking {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Returns true if the key was kept.
    pub fn offer(&mut self, key: K) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(key);
            return true;
        }
        match self.heap.peek() {
            Some(worst) if key < *worst => {
                self.heap.pop();
                self.heap.push(key);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Kept keys, smallest first.
    pub fn into_sorted_vec(self) -> Vec<K> {
        self.heap.into_sorted_vec()
    }
}

impl<K: Ord + Clone> BoundedRanking<K> {
    pub fn sorted(&self) -> Vec<K> {
        self.clone().into_sorted_vec()
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

pub struct Aggregator {
    top: Mutex<BoundedRanking<Reverse<RankedLineup>>>,
    bottom: Mutex<BoundedRanking<RankedLineup>>,
    stats: DashMap<u64, Agg>,
    processed: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking worker cannot leave a ranking half-updated: every
    // mutation is a single push/pop pair.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Aggregator {
    pub fn new(top_k: usize, bottom_k: usize) -> Self {
        Aggregator {
            top: Mutex::new(BoundedRanking::new(top_k)),
            bottom: Mutex::new(BoundedRanking::new(bottom_k)),
            stats: DashMap::new(),
            processed: AtomicU64::new(0),
        }
    }

    /// Fold one finished lineup into the rankings and statistics. Returns the
    /// number of lineups recorded so far, this one included.
    pub fn record(&self, result: &LineupResult) -> u64 {
        lock(&self.top).offer(Reverse(RankedLineup(result.clone())));
        lock(&self.bottom).offer(RankedLineup(result.clone()));

        {
            let mut agg = self.stats.entry(result.hash).or_default();
            agg.games += result.games;
            agg.runs += result.runs;
            agg.hits += result.hits;
        }

        self.processed.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Best lineups, highest mean runs first.
    pub fn top(&self) -> Vec<LineupResult> {
        lock(&self.top)
            .sorted()
            .into_iter()
            .map(|Reverse(ranked)| ranked.0)
            .collect()
    }

    /// Worst lineups, lowest mean runs first.
    pub fn bottom(&self) -> Vec<LineupResult> {
        lock(&self.bottom)
            .sorted()
            .into_iter()
            .map(|ranked| ranked.0)
            .collect()
    }

    /// Cumulative totals for a lineup identity across every recorded result.
    pub fn stats(&self, hash: u64) -> Option<Agg> {
        self.stats.get(&hash).map(|agg| *agg)
    }

    /// Copy of every identity's totals, in no particular order.
    pub fn all_stats(&self) -> Vec<(u64, Agg)> {
        self.stats.iter().map(|entry| (*entry.key(), *entry.value())).collect()
    }

    pub fn distinct_lineups(&self) -> usize {
        self.stats.len()
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(AtomicOrdering::Relaxed)
    }

    pub fn top_capacity(&self) -> usize {
        lock(&self.top).capacity()
    }

    pub fn bottom_capacity(&self) -> usize {
        lock(&self.bottom).capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn result(mean_runs: f64, hash: u64) -> LineupResult {
        LineupResult {
            mean_runs,
            order: vec![format!("L{hash}")],
            hash,
            games: 10,
            runs: (mean_runs * 10.0).round() as u64,
            hits: 7,
            left_on_base: 3,
        }
    }

    #[test]
    fn bounded_ranking_keeps_smallest() {
        let mut r = BoundedRanking::new(3);
        for k in [5, 1, 9, 3, 7, 2] {
            r.offer(k);
        }
        assert_eq!(r.len(), 3);
        assert_eq!(r.into_sorted_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn bounded_ranking_with_reverse_keeps_largest() {
        let mut r = BoundedRanking::new(2);
        for k in [5, 1, 9, 3, 7] {
            r.offer(Reverse(k));
        }
        let kept: Vec<i32> = r.into_sorted_vec().into_iter().map(|Reverse(k)| k).collect();
        assert_eq!(kept, vec![9, 7]);
    }

    #[test]
    fn bounded_ranking_zero_capacity_keeps_nothing() {
        let mut r = BoundedRanking::new(0);
        assert!(!r.offer(1));
        assert!(r.is_empty());
    }

    #[test]
    fn equal_key_does_not_replace() {
        let mut r = BoundedRanking::new(1);
        assert!(r.offer(4));
        assert!(!r.offer(4));
        assert!(r.offer(3));
    }

    #[test]
    fn ties_on_mean_break_by_hash() {
        let a = RankedLineup(result(4.0, 1));
        let b = RankedLineup(result(4.0, 2));
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn top_and_bottom_are_sorted() {
        let agg = Aggregator::new(3, 2);
        for (i, mean) in [4.1, 3.2, 5.5, 4.8, 2.9, 3.9].iter().enumerate() {
            agg.record(&result(*mean, i as u64));
        }
        let top: Vec<f64> = agg.top().iter().map(|r| r.mean_runs).collect();
        let bottom: Vec<f64> = agg.bottom().iter().map(|r| r.mean_runs).collect();
        assert_eq!(top, vec![5.5, 4.8, 4.1]);
        assert_eq!(bottom, vec![2.9, 3.2]);
        assert_eq!(agg.processed(), 6);
    }

    #[test]
    fn fewer_results_than_capacity() {
        let agg = Aggregator::new(256, 10);
        agg.record(&result(4.0, 1));
        agg.record(&result(3.0, 2));
        assert_eq!(agg.top().len(), 2);
        assert_eq!(agg.bottom().len(), 2);
    }

    #[test]
    fn repeated_identity_accumulates_stats() {
        let agg = Aggregator::new(5, 5);
        agg.record(&result(4.0, 77));
        agg.record(&result(6.0, 77));
        let stats = agg.stats(77).unwrap();
        assert_eq!(stats.games, 20);
        assert_eq!(stats.runs, 100);
        assert_eq!(stats.hits, 14);
        assert!((stats.mean_runs() - 5.0).abs() < 1e-12);
        assert_eq!(agg.distinct_lineups(), 1);
        assert!(agg.stats(78).is_none());
    }

    #[test]
    fn concurrent_records_lose_nothing() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 2_000;
        let agg = Arc::new(Aggregator::new(50, 10));

        thread::scope(|s| {
            for t in 0..THREADS {
                let agg = Arc::clone(&agg);
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        let id = t * PER_THREAD + i;
                        // Distinct means, interleaved across threads.
                        let mean = (id * 7919 % (THREADS * PER_THREAD)) as f64 / 100.0;
                        agg.record(&result(mean, id));
                    }
                });
            }
        });

        let total = THREADS * PER_THREAD;
        assert_eq!(agg.processed(), total);
        assert_eq!(agg.distinct_lineups() as u64, total);

        let top = agg.top();
        assert_eq!(top.len(), 50);
        let expected_top: Vec<f64> = (0..50).map(|i| (total - 1 - i) as f64 / 100.0).collect();
        let got_top: Vec<f64> = top.iter().map(|r| r.mean_runs).collect();
        assert_eq!(got_top, expected_top);

        let bottom = agg.bottom();
        let got_bottom: Vec<f64> = bottom.iter().map(|r| r.mean_runs).collect();
        let expected_bottom: Vec<f64> = (0..10).map(|i| i as f64 / 100.0).collect();
        assert_eq!(got_bottom, expected_bottom);

        let mut hashes: Vec<u64> = top.iter().map(|r| r.hash).collect();
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), 50);
    }
}
