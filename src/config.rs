use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{self, BufReader},
    net::{Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};

use crate::{
    packet::Metadata,
    sampler::{TimestampResolution, RAND_MAX},
};

pub const DEFAULT_TARGET_PORT: u16 = 6666;

/// Adapter settings. Every key is optional; a missing file or an empty object
/// yields the compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: SocketAddr,
    pub interval_ms: u64,
    #[serde(flatten)]
    pub metadata: Metadata,
    pub value_min: i64,
    pub value_max: i64,
    pub timestamp: TimestampResolution,
    pub buffer_capacity: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_TARGET_PORT)),
            interval_ms: 1000,
            metadata: Metadata::default(),
            value_min: 0,
            value_max: RAND_MAX,
            timestamp: TimestampResolution::Seconds,
            buffer_capacity: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;

        let config: Config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Config> {
        match Config::load(path.as_ref()) {
            Err(err) if is_not_found(&err) => Ok(Config::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.value_min <= self.value_max,
            "value_min ({}) is greater than value_max ({})",
            self.value_min,
            self.value_max
        );
        if let Some(capacity) = self.buffer_capacity {
            ensure!(capacity > 0, "buffer_capacity must be positive");
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .map_or(false, |err| err.kind() == io::ErrorKind::NotFound)
}
