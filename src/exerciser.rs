use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bst::BstSet;
use crate::config::Config;
use crate::error::NotFound;
use crate::metrics::TreeMetrics;

/// The driver loop. Owns the tree outright and is its only writer; the only
/// thing that crosses to the scrape path are the metric instruments.
///
/// Each cycle attempts one randomized insert and one randomized remove,
/// reports every outcome, then sleeps for the configured pace. A duplicate
/// insert and a remove miss are ordinary outcomes here, counted and never
/// propagated.
pub struct Exerciser {
    tree: BstSet<i32>,
    metrics: TreeMetrics,
    min_value: i32,
    max_value: i32,
    pace: Duration,
    rng: SmallRng,
    stop: Arc<AtomicBool>,
    cycles: u64,
}

impl Exerciser {
    pub fn new(metrics: TreeMetrics, config: &Config) -> Exerciser {
        Self::with_rng(metrics, config, SmallRng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(metrics: TreeMetrics, config: &Config, seed: u64) -> Exerciser {
        Self::with_rng(metrics, config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(metrics: TreeMetrics, config: &Config, rng: SmallRng) -> Exerciser {
        Exerciser {
            tree: BstSet::new(),
            metrics,
            min_value: config.min_value,
            max_value: config.max_value,
            pace: config.pace,
            rng,
            stop: Arc::new(AtomicBool::new(false)),
            cycles: 0,
        }
    }

    /// Handle to request a clean shutdown; the flag is checked once per
    /// cycle, so the loop winds down at the next cycle boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn tree(&self) -> &BstSet<i32> {
        &self.tree
    }

    /// Runs cycles at the configured pace until a stop is requested.
    pub fn run(&mut self) {
        info!(
            "exerciser started: keys in [{}, {}], pace {:?}",
            self.min_value, self.max_value, self.pace
        );
        while !self.stop.load(Ordering::Relaxed) {
            self.cycle();
            thread::sleep(self.pace);
        }
        info!("exerciser stopped after {} cycles", self.cycles);
    }

    /// Runs exactly `n` cycles back to back, without pacing. Test entry
    /// point; the contract per cycle is identical to [`run`](Self::run).
    pub fn run_cycles(&mut self, n: u64) {
        for _ in 0..n {
            self.cycle();
        }
    }

    fn cycle(&mut self) {
        self.metrics.record_cycle();

        let add_key = self.draw_key();
        let timer = self.metrics.start_add_timer();
        let inserted = self.tree.insert(add_key);
        timer.observe_duration();
        if inserted {
            self.metrics.record_add();
            debug!("inserted {}, tree holds {} nodes", add_key, self.tree.len());
        } else {
            self.metrics.record_failed_add();
            debug!("insert of {} was a duplicate", add_key);
        }

        let remove_key = self.draw_key();
        match self.tree.remove(&remove_key) {
            Ok(()) => {
                self.metrics.record_remove();
                debug!("removed {}, tree holds {} nodes", remove_key, self.tree.len());
            }
            Err(NotFound) => {
                self.metrics.record_failed_remove();
                debug!("remove of {} missed", remove_key);
            }
        }

        self.cycles += 1;
    }

    fn draw_key(&mut self) -> i32 {
        self.rng.gen_range(self.min_value..=self.max_value)
    }
}
