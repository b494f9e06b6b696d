pub mod bst;
pub mod config;
pub mod error;
pub mod exerciser;
pub mod exporter;
pub mod metrics;

pub use crate::bst::BstSet;
pub use crate::config::Config;
pub use crate::error::NotFound;
pub use crate::exerciser::Exerciser;
pub use crate::exporter::MetricsExporter;
pub use crate::metrics::TreeMetrics;
