// Producer / worker pipeline.
//
// One producer enumerates lineups into a bounded channel; a fixed pool of
// workers pulls from the shared receiver, simulates every lineup
// `games_per_lineup` times and records the summary in the shared
// `Aggregator`. Producer and workers are CPU-bound and run on tokio's
// blocking pool; the only suspension points are channel send/receive.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::aggregate::{Aggregator, DEFAULT_BOTTOM_K};
use crate::enumerate;
use crate::error::{PipelineError, RosterError};
use crate::game::{self, FixedHand, PitcherStrategy};
use crate::lineup::Lineup;
use crate::player::Roster;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Upper bound on the worker pool. Workers and the producer share tokio's
/// blocking pool, which holds 512 threads by default.
pub const MAX_WORKERS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Independent games simulated per lineup.
    pub games_per_lineup: u32,
    /// Capacity of the best-lineups ranking.
    pub top_k: usize,
    /// Capacity of the worst-lineups ranking.
    pub bottom_k: usize,
    /// Worker count, at most [`MAX_WORKERS`]; 0 uses every available core.
    pub workers: usize,
    /// Lineups buffered between the producer and the workers.
    pub queue_capacity: usize,
    /// Base seed for the worker RNG streams; random when unset.
    pub seed: Option<u64>,
    /// Stop enumerating after this many lineups.
    pub max_lineups: Option<u64>,
    /// Notify the progress sink every this many processed lineups.
    pub progress_interval: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            games_per_lineup: 200,
            top_k: 256,
            bottom_k: DEFAULT_BOTTOM_K,
            workers: 0,
            queue_capacity: 1024,
            seed: None,
            max_lineups: None,
            progress_interval: 100_000,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let positive: &[(&str, u64)] = &[
            ("games_per_lineup", u64::from(self.games_per_lineup)),
            ("top_k", self.top_k as u64),
            ("bottom_k", self.bottom_k as u64),
            ("queue_capacity", self.queue_capacity as u64),
            ("progress_interval", self.progress_interval),
        ];
        for (field, value) in positive {
            if *value == 0 {
                return Err(PipelineError::InvalidSettings {
                    field: field.to_string(),
                    message: "must be > 0".into(),
                });
            }
        }
        if self.workers > MAX_WORKERS {
            return Err(PipelineError::InvalidSettings {
                field: "workers".into(),
                message: format!("must be at most {MAX_WORKERS}, got {}", self.workers),
            });
        }
        Ok(())
    }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().min(MAX_WORKERS))
            .unwrap_or(1)
    }
}

// ---------------------------------------------------------------------------
// Progress and cancellation
// ---------------------------------------------------------------------------

/// Observer for the running total of processed lineups. Purely informational.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, processed: u64);
}

impl<F> ProgressSink for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_progress(&self, processed: u64) {
        self(processed)
    }
}

/// Asks the producer to stop enumerating. Lineups already queued are still
/// simulated and recorded.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Worker RNG: one ChaCha stream per worker from a shared base seed.
pub fn worker_rng(seed: u64, worker_id: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(worker_id as u64);
    rng
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// What a finished run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Lineups the producer queued.
    pub produced: u64,
    /// Lineups the workers simulated and recorded.
    pub processed: u64,
    /// Whether the enumeration ran to completion.
    pub exhausted: bool,
    pub workers: usize,
    pub seed: u64,
    pub elapsed: Duration,
}

pub struct Pipeline {
    roster: Arc<Roster>,
    settings: SimulationSettings,
    strategy: Arc<dyn PitcherStrategy>,
    progress: Option<Arc<dyn ProgressSink>>,
    stop: StopHandle,
}

impl Pipeline {
    /// Pitchers are right-handed unless a strategy is supplied.
    pub fn new(roster: Arc<Roster>, settings: SimulationSettings) -> Self {
        Pipeline {
            roster,
            settings,
            strategy: Arc::new(FixedHand::default()),
            progress: None,
            stop: StopHandle::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn PitcherStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// An empty aggregator sized by `top_k` / `bottom_k`.
    pub fn new_aggregator(&self) -> Arc<Aggregator> {
        Arc::new(Aggregator::new(self.settings.top_k, self.settings.bottom_k))
    }

    /// Enumerate and simulate every lineup, recording results in
    /// `aggregator`. Passing the same aggregator to several runs merges their
    /// per-lineup statistics.
    ///
    /// The aggregator's ranking capacities must match `top_k` / `bottom_k`.
    pub async fn run(&self, aggregator: Arc<Aggregator>) -> Result<RunSummary, PipelineError> {
        self.settings.validate()?;
        let capacities = [
            ("top_k", self.settings.top_k, aggregator.top_capacity()),
            ("bottom_k", self.settings.bottom_k, aggregator.bottom_capacity()),
        ];
        for (field, configured, actual) in capacities {
            if configured != actual {
                return Err(PipelineError::InvalidSettings {
                    field: field.to_string(),
                    message: format!("aggregator keeps {actual} lineups, settings ask for {configured}"),
                });
            }
        }

        let workers = self.settings.worker_count();
        let seed = self.settings.seed.unwrap_or_else(rand::random);
        let started = Instant::now();

        info!(
            players = self.roster.len(),
            lineups = %enumerate::lineup_count(self.roster.len()),
            games_per_lineup = self.settings.games_per_lineup,
            workers,
            seed,
            "starting lineup simulation"
        );

        let (tx, rx) = mpsc::channel::<Lineup>(self.settings.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));

        // The producer takes a blocking thread before any worker can park on
        // the empty queue.
        let producer = Producer {
            roster_size: self.roster.len(),
            tx,
            stop: self.stop.clone(),
            limit: self.settings.max_lineups,
        };
        let production = tokio::task::spawn_blocking(move || producer.run());

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                roster: Arc::clone(&self.roster),
                strategy: Arc::clone(&self.strategy),
                aggregator: Arc::clone(&aggregator),
                progress: self.progress.clone(),
                games: self.settings.games_per_lineup,
                progress_interval: self.settings.progress_interval,
                rng: worker_rng(seed, id),
            };
            handles.push(tokio::task::spawn_blocking(move || worker.run()));
        }
        // Workers hold the only receivers now, so the producer sees a closed
        // channel if they all exit.
        drop(queue);

        let production = production.await??;

        let mut processed = 0;
        for handle in handles {
            processed += handle.await?;
        }

        let summary = RunSummary {
            produced: production.produced,
            processed,
            exhausted: production.exhausted,
            workers,
            seed,
            elapsed: started.elapsed(),
        };
        info!(
            processed = summary.processed,
            exhausted = summary.exhausted,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "lineup simulation finished"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

struct Production {
    produced: u64,
    exhausted: bool,
}

struct Producer {
    roster_size: usize,
    tx: mpsc::Sender<Lineup>,
    stop: StopHandle,
    limit: Option<u64>,
}

impl Producer {
    fn run(self) -> Result<Production, RosterError> {
        let mut produced = 0u64;
        let flow = enumerate::for_each_lineup(self.roster_size, |lineup| {
            if self.stop.is_stopped() || self.limit.is_some_and(|max| produced >= max) {
                return ControlFlow::Break(());
            }
            // Blocks while the queue is full; fails once every worker is gone.
            if self.tx.blocking_send(lineup).is_err() {
                return ControlFlow::Break(());
            }
            produced += 1;
            ControlFlow::Continue(())
        })?;

        debug!(produced, "producer finished");
        Ok(Production {
            produced,
            exhausted: flow.is_continue(),
        })
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct Worker {
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Lineup>>>,
    roster: Arc<Roster>,
    strategy: Arc<dyn PitcherStrategy>,
    aggregator: Arc<Aggregator>,
    progress: Option<Arc<dyn ProgressSink>>,
    games: u32,
    progress_interval: u64,
    rng: ChaCha8Rng,
}

impl Worker {
    /// Returns the number of lineups this worker simulated.
    fn run(mut self) -> u64 {
        debug!(worker = self.id, "worker started");
        let mut simulated = 0u64;
        loop {
            let next = self.queue.blocking_lock().blocking_recv();
            let Some(lineup) = next else {
                break;
            };

            let result = game::simulate_lineup(
                &self.roster,
                &lineup,
                self.games,
                self.strategy.as_ref(),
                &mut self.rng,
            );
            let total = self.aggregator.record(&result);
            simulated += 1;

            if let Some(progress) = &self.progress {
                if total % self.progress_interval == 0 {
                    progress.on_progress(total);
                }
            }
        }
        debug!(worker = self.id, simulated, "worker finished");
        simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn default_settings_are_valid() {
        let settings = SimulationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bottom_k, 10);
        assert_eq!(settings.top_k, 256);
    }

    #[test]
    fn zero_games_rejected() {
        let settings = SimulationSettings {
            games_per_lineup: 0,
            ..SimulationSettings::default()
        };
        match settings.validate() {
            Err(PipelineError::InvalidSettings { field, .. }) => assert_eq!(field, "games_per_lineup"),
            other => panic!("expected InvalidSettings, got {other:?}"),
        }
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let settings = SimulationSettings {
            queue_capacity: 0,
            ..SimulationSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_bottom_k_rejected() {
        let settings = SimulationSettings {
            bottom_k: 0,
            ..SimulationSettings::default()
        };
        match settings.validate() {
            Err(PipelineError::InvalidSettings { field, .. }) => assert_eq!(field, "bottom_k"),
            other => panic!("expected InvalidSettings, got {other:?}"),
        }
    }

    #[test]
    fn worker_ceiling_enforced() {
        let at_limit = SimulationSettings {
            workers: MAX_WORKERS,
            ..SimulationSettings::default()
        };
        assert!(at_limit.validate().is_ok());

        let over = SimulationSettings {
            workers: MAX_WORKERS + 1,
            ..SimulationSettings::default()
        };
        match over.validate() {
            Err(PipelineError::InvalidSettings { field, .. }) => assert_eq!(field, "workers"),
            other => panic!("expected InvalidSettings, got {other:?}"),
        }
    }

    #[test]
    fn zero_workers_means_available_cores() {
        let settings = SimulationSettings::default();
        assert!(settings.worker_count() >= 1);
        assert!(settings.worker_count() <= MAX_WORKERS);
        let fixed = SimulationSettings {
            workers: 3,
            ..SimulationSettings::default()
        };
        assert_eq!(fixed.worker_count(), 3);
    }

    #[test]
    fn worker_streams_differ_and_repeat() {
        let draws = |mut rng: ChaCha8Rng| (0..4).map(|_| rng.gen::<u64>()).collect::<Vec<_>>();
        assert_ne!(draws(worker_rng(5, 0)), draws(worker_rng(5, 1)));
        assert_eq!(draws(worker_rng(5, 0)), draws(worker_rng(5, 0)));
        assert_ne!(draws(worker_rng(5, 0)), draws(worker_rng(6, 0)));
    }

    #[test]
    fn stop_handle_is_shared() {
        let handle = StopHandle::default();
        let clone = handle.clone();
        assert!(!clone.is_stopped());
        handle.stop();
        assert!(clone.is_stopped());
    }

    #[test]
    fn closures_are_progress_sinks() {
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |n: u64| seen.lock().unwrap().push(n);
        sink.on_progress(100);
        sink.on_progress(200);
        assert_eq!(*seen.lock().unwrap(), vec![100, 200]);
    }
}
