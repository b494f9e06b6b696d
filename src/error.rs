use std::io;

use thiserror::Error;

/// Failure signal for a remove attempt on an absent key.
///
/// This is an expected outcome of normal operation: the driver recovers at
/// the call site by bumping a counter and moving on. It never crosses the
/// driver boundary as an unhandled error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key not found in tree")]
pub struct NotFound;

/// Failures of the metrics exposition endpoint. Non-fatal to the exerciser:
/// the driver loop keeps running whether or not scraping works.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("could not bind metrics endpoint on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("could not encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

/// Rejected command-line overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {arg}: {source}")]
    BadValue {
        arg: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("empty key range: min {min} exceeds max {max}")]
    EmptyRange { min: i32, max: i32 },
}
