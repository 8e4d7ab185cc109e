use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::simulation::Policy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("LATENCY_MIN_MS ({min}) must not exceed LATENCY_MAX_MS ({max})")]
    LatencyBounds { min: u64, max: u64 },
}

/// Process settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub log_file: String,
    pub body_limit: usize,
    /// Seeds the simulator's generator for reproducible runs.
    pub rng_seed: Option<u64>,
    pub policy: Policy,
}

impl Config {
    /// Reads the process environment, including a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // optional fields
        let port = parse_or(&lookup, "PORT", 8001u16)?;
        let log_file = lookup("LOG_FILE").unwrap_or("payment-processor.log".to_string());
        let body_limit = parse_or(&lookup, "BODY_LIMIT_BYTES", 64 * 1024usize)?;
        let rng_seed = match lookup("RNG_SEED") {
            Some(raw) => Some(parse("RNG_SEED", &raw)?),
            None => None,
        };

        let approval_rate = parse_or(&lookup, "APPROVAL_RATE", 0.8f64)?;
        if !(0.0..=1.0).contains(&approval_rate) {
            return Err(ConfigError::Invalid {
                key: "APPROVAL_RATE",
                value: approval_rate.to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }

        let min = parse_or(&lookup, "LATENCY_MIN_MS", 100u64)?;
        let max = parse_or(&lookup, "LATENCY_MAX_MS", 500u64)?;
        if min > max {
            return Err(ConfigError::LatencyBounds { min, max });
        }

        Ok(Self {
            port,
            log_file,
            body_limit,
            rng_seed,
            policy: Policy {
                approval_rate,
                latency_min: Duration::from_millis(min),
                latency_max: Duration::from_millis(max),
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}
