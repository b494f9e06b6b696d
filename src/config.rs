use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MIN_VALUE: i32 = 0;
pub const DEFAULT_MAX_VALUE: i32 = 300;
pub const DEFAULT_PACE_MS: u64 = 1000;

/// Runtime knobs of the exerciser. Positional overrides on the command
/// line, in order: port, pace in milliseconds, minimum key, maximum key.
/// Anything not given keeps its default.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the metrics endpoint listens on.
    pub port: u16,
    /// Inclusive lower bound of the random key range.
    pub min_value: i32,
    /// Inclusive upper bound of the random key range.
    pub max_value: i32,
    /// Fixed delay between driver cycles.
    pub pace: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            port: DEFAULT_PORT,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
            pace: Duration::from_millis(DEFAULT_PACE_MS),
        }
    }
}

impl Config {
    pub fn from_args<I>(mut args: I) -> Result<Config, ConfigError>
    where
        I: Iterator<Item = String>,
    {
        let mut config = Config::default();
        if let Some(port) = args.next() {
            config.port = parse(&port, "port")?;
        }
        if let Some(pace_ms) = args.next() {
            let ms: u64 = parse(&pace_ms, "pace_ms")?;
            config.pace = Duration::from_millis(ms);
        }
        if let Some(min) = args.next() {
            config.min_value = parse(&min, "min")?;
        }
        if let Some(max) = args.next() {
            config.max_value = parse(&max, "max")?;
        }
        if config.min_value > config.max_value {
            return Err(ConfigError::EmptyRange {
                min: config.min_value,
                max: config.max_value,
            });
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    value: &str,
    arg: &'static str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|source| ConfigError::BadValue {
        arg,
        value: value.to_string(),
        source,
    })
}
