use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Largest value produced by the C library `rand()` on glibc.
pub const RAND_MAX: i64 = 2_147_483_647;

/// One generated value paired with the time it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub v: i64,
    pub ts: i64,
}

#[derive(Error, Debug, PartialEq)]
#[error("empty value range {min}..={max}")]
pub struct EmptyRange {
    pub min: i64,
    pub max: i64,
}

pub trait Clock {
    /// Time since the Unix epoch, in the clock's own resolution.
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampResolution {
    Seconds,
    Millis,
}

impl Default for TimestampResolution {
    fn default() -> Self {
        TimestampResolution::Seconds
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    resolution: TimestampResolution,
}

impl SystemClock {
    pub fn new(resolution: TimestampResolution) -> Self {
        SystemClock { resolution }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        // A clock set before the epoch reports zero.
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        match self.resolution {
            TimestampResolution::Seconds => elapsed.as_secs() as i64,
            TimestampResolution::Millis => elapsed.as_millis() as i64,
        }
    }
}

pub trait SampleSource {
    fn sample(&mut self) -> Sample;
}

/// Draws uniformly distributed values from an owned generator and stamps them
/// with the given clock.
pub struct Sampler<R, C> {
    rng: R,
    clock: C,
    values: Uniform<i64>,
}

impl<R: Rng, C: Clock> Sampler<R, C> {
    pub fn new(rng: R, clock: C, min: i64, max: i64) -> Result<Self, EmptyRange> {
        if min > max {
            return Err(EmptyRange { min, max });
        }

        Ok(Sampler {
            rng,
            clock,
            values: Uniform::new_inclusive(min, max),
        })
    }
}

impl<R: Rng, C: Clock> SampleSource for Sampler<R, C> {
    fn sample(&mut self) -> Sample {
        let v = self.values.sample(&mut self.rng);
        let ts = self.clock.now();

        Sample { v, ts }
    }
}
