use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://gorest.co.in/public/v2/graphql";

/// Harness settings: where to send requests and how to schedule scenarios.
#[derive(Clone, Deserialize, Serialize, Debug)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub token: Option<String>,
    /// Wall-clock limit per scenario.
    pub timeout_secs: u64,
    /// Upper bound on scenarios in flight.
    pub workers: usize,
    /// Run scenarios of the same group concurrently instead of in order.
    pub fully_parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            token: None,
            timeout_secs: 30,
            workers: default_workers(),
            fully_parallel: false,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|cores| (cores.get() / 2).max(1))
        .unwrap_or(1)
}

fn parse<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} has an invalid value `{value}`")))
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// `.env`, then the file named by `HARNESS_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = match std::env::var("HARNESS_CONFIG") {
            Ok(path) => {
                log::debug!("reading harness config from {}", path);
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            Err(..) => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(endpoint) = lookup("GRAPHQL_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(token) = lookup("GO_REST_API_TOKEN") {
            self.token = Some(token);
        }
        if self.token.as_deref().is_some_and(|token| token.trim().is_empty()) {
            self.token = None;
        }
        if let Some(timeout) = lookup("HARNESS_TIMEOUT_SECS") {
            self.timeout_secs = parse("HARNESS_TIMEOUT_SECS", &timeout)?;
        }
        match lookup("HARNESS_WORKERS") {
            Some(workers) => self.workers = parse("HARNESS_WORKERS", &workers)?,
            None if lookup("CI").is_some() => self.workers = 3,
            None => {}
        }
        if let Some(fully_parallel) = lookup("HARNESS_FULLY_PARALLEL") {
            self.fully_parallel = parse("HARNESS_FULLY_PARALLEL", &fully_parallel)?;
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_owned()));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
