use log::{debug, error, warn};
use std::{net::SocketAddr, time::Duration};

use crate::{
    packet::{EncodeError, Metadata, PacketEncoder, SamplePacket},
    sampler::SampleSource,
    shutdown::Shutdown,
    udp::Transport,
};

/// What happened during a single pass of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// The datagram was handed to the network stack.
    Sent(usize),
    /// The packet did not fit the encoder and nothing was sent.
    Overflow,
    /// Encoding or transport failed.
    SendFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub iterations: u64,
    pub sent: u64,
    pub overflowed: u64,
    pub failed: u64,
}

impl RunStats {
    fn record(&mut self, iteration: Iteration) {
        self.iterations += 1;
        match iteration {
            Iteration::Sent(_) => self.sent += 1,
            Iteration::Overflow => self.overflowed += 1,
            Iteration::SendFailed => self.failed += 1,
        }
    }
}

pub struct SamplePipeline<Source, Sender> {
    source: Source,
    encoder: PacketEncoder,
    metadata: Metadata,
    sender: Sender,
    target: SocketAddr,
    interval: Duration,
    shutdown: Shutdown,
}

impl<Source, Sender> SamplePipeline<Source, Sender>
where
    Source: SampleSource,
    Sender: Transport,
{
    pub fn new(
        source: Source,
        encoder: PacketEncoder,
        metadata: Metadata,
        sender: Sender,
        target: SocketAddr,
        interval: Duration,
        shutdown: Shutdown,
    ) -> Self {
        SamplePipeline {
            source,
            encoder,
            metadata,
            sender,
            target,
            interval,
            shutdown,
        }
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn run_once(&mut self) -> Iteration {
        let sample = self.source.sample();
        let packet = SamplePacket::new(&self.metadata, sample);

        let payload = match self.encoder.encode(&packet) {
            Ok(payload) => payload,
            Err(err @ EncodeError::Overflow { .. }) => {
                error!("{}", err);
                return Iteration::Overflow;
            }
            Err(err) => {
                warn!("{}", err);
                return Iteration::SendFailed;
            }
        };

        debug!("{}", String::from_utf8_lossy(payload));

        match self.sender.send_to(payload, self.target) {
            Ok(sent) => Iteration::Sent(sent),
            Err(err) => {
                warn!("{:#}", anyhow::Error::new(err).context("dropping sample"));
                Iteration::SendFailed
            }
        }
    }

    /// Samples and sends once per interval until the shutdown token fires.
    pub fn run(&mut self) -> RunStats {
        let mut stats = RunStats::default();

        while !self.shutdown.is_triggered() {
            stats.record(self.run_once());

            if self.shutdown.wait_timeout(self.interval) {
                break;
            }
        }

        stats
    }
}
