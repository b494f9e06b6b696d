use std::sync::Arc;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramTimer, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "tree";

/// The instrument handles the exerciser reports into.
///
/// All instruments are registered on an explicitly constructed registry, not
/// a process-wide default, and handed to the driver and the exporter by
/// value. The prometheus primitives are internally atomic, so the driver
/// thread updates them while any number of scrape handlers read.
#[derive(Clone, Debug)]
pub struct TreeMetrics {
    registry: Arc<Registry>,
    iterations: IntCounter,
    failed_adds: IntCounter,
    failed_removes: IntCounter,
    nodes: IntGauge,
    add_time: Histogram,
}

impl TreeMetrics {
    /// Builds the registry and registers the five instruments on it.
    pub fn new() -> Result<TreeMetrics, prometheus::Error> {
        let registry = Registry::new();

        let iterations = IntCounter::with_opts(
            Opts::new(
                "number_of_iterations",
                "Counts the number of attempted inserts and removes",
            )
            .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(iterations.clone()))?;

        let failed_adds = IntCounter::with_opts(
            Opts::new(
                "number_of_failed_adds",
                "Counts the number of failed attempts to add",
            )
            .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(failed_adds.clone()))?;

        let failed_removes = IntCounter::with_opts(
            Opts::new(
                "number_of_failed_removes",
                "Counts the number of failed attempts to remove",
            )
            .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(failed_removes.clone()))?;

        let nodes = IntGauge::with_opts(
            Opts::new("number_of_nodes", "Records the number of nodes").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(nodes.clone()))?;

        let add_time = Histogram::with_opts(
            HistogramOpts::new("add_time", "Records the time to add a node in seconds")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(add_time.clone()))?;

        Ok(TreeMetrics {
            registry: Arc::new(registry),
            iterations,
            failed_adds,
            failed_removes,
            nodes,
            add_time,
        })
    }

    /// One per driver cycle, unconditionally.
    pub fn record_cycle(&self) {
        self.iterations.inc();
    }

    /// Starts timing an insert call. Dropping or observing the returned
    /// timer records the elapsed wall-clock seconds regardless of outcome.
    pub fn start_add_timer(&self) -> HistogramTimer {
        self.add_time.start_timer()
    }

    pub fn record_add(&self) {
        self.nodes.inc();
    }

    pub fn record_failed_add(&self) {
        self.failed_adds.inc();
    }

    pub fn record_remove(&self) {
        self.nodes.dec();
    }

    pub fn record_failed_remove(&self) {
        self.failed_removes.inc();
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.get()
    }

    pub fn failed_adds(&self) -> u64 {
        self.failed_adds.get()
    }

    pub fn failed_removes(&self) -> u64 {
        self.failed_removes.get()
    }

    pub fn nodes(&self) -> i64 {
        self.nodes.get()
    }

    /// Current values of every registered family in the Prometheus text
    /// exposition format.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruments_register_and_update() {
        let metrics = TreeMetrics::new().unwrap();
        metrics.record_cycle();
        metrics.record_cycle();
        metrics.record_add();
        metrics.record_add();
        metrics.record_remove();
        metrics.record_failed_add();
        metrics.record_failed_remove();

        assert_eq!(metrics.iterations(), 2);
        assert_eq!(metrics.nodes(), 1);
        assert_eq!(metrics.failed_adds(), 1);
        assert_eq!(metrics.failed_removes(), 1);
    }

    #[test]
    fn timer_feeds_the_histogram() {
        let metrics = TreeMetrics::new().unwrap();
        let timer = metrics.start_add_timer();
        timer.observe_duration();
        let text = metrics.gather().unwrap();
        assert!(text.contains("tree_add_time_count 1"));
    }

    #[test]
    fn gather_exposes_all_families() {
        let metrics = TreeMetrics::new().unwrap();
        metrics.record_cycle();
        let text = metrics.gather().unwrap();
        for family in [
            "tree_number_of_iterations",
            "tree_number_of_failed_adds",
            "tree_number_of_failed_removes",
            "tree_number_of_nodes",
            "tree_add_time",
        ] {
            assert!(text.contains(family), "missing family {}", family);
        }
    }

    #[test]
    fn clones_share_the_same_instruments() {
        let metrics = TreeMetrics::new().unwrap();
        let other = metrics.clone();
        metrics.record_cycle();
        other.record_cycle();
        assert_eq!(metrics.iterations(), 2);
    }
}
