pub mod config;
pub mod packet;
pub mod pipeline;
pub mod sampler;
pub mod shutdown;
pub mod udp;

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};

use config::Config;
use packet::PacketEncoder;
use pipeline::SamplePipeline;
use sampler::{Sampler, SystemClock};
use shutdown::Shutdown;
use udp::UdpSender;

pub type RandomPipeline = SamplePipeline<Sampler<StdRng, SystemClock>, UdpSender>;

/// Wires an entropy-seeded sampler, the system clock and a UDP sender
/// according to `config`.
pub fn build_pipeline(config: &Config, shutdown: Shutdown) -> Result<RandomPipeline> {
    let sampler = Sampler::new(
        StdRng::from_entropy(),
        SystemClock::new(config.timestamp),
        config.value_min,
        config.value_max,
    )?;

    let encoder = match config.buffer_capacity {
        Some(capacity) => PacketEncoder::with_capacity(capacity),
        None => PacketEncoder::new(&config.metadata).context("Failed to size packet buffer")?,
    };

    Ok(SamplePipeline::new(
        sampler,
        encoder,
        config.metadata.clone(),
        UdpSender::new(),
        config.target,
        config.interval(),
        shutdown,
    ))
}
