use serde::{Deserialize, Serialize};
use serde_json::{ser::Formatter, Serializer};
use std::io;
use thiserror::Error;

use crate::sampler::Sample;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("run out of space in buffer: packet is {len} bytes, capacity is {capacity}")]
    Overflow { len: usize, capacity: usize },
    #[error("failed to serialize packet")]
    Json(#[from] serde_json::Error),
}

/// Fixed tags attached to every sample sent by a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub name: String,
    pub path: String,
    pub unit: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            name: "RandomNumber".to_string(),
            path: "ProCem/Core".to_string(),
            unit: "Num".to_string(),
        }
    }
}

impl Metadata {
    /// Length of the longest packet these tags can render to, reached when
    /// both integers are `i64::MIN`.
    pub fn max_packet_len(&self) -> Result<usize, EncodeError> {
        let worst = Sample {
            v: i64::MIN,
            ts: i64::MIN,
        };

        let mut buf = Vec::new();
        write_packet(&mut buf, &SamplePacket::new(self, worst))?;

        Ok(buf.len())
    }
}

/// IoT-Ticket style measurement. Field order is the wire order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePacket<'a> {
    name: &'a str,
    path: &'a str,
    v: i64,
    ts: i64,
    unit: &'a str,
}

impl<'a> SamplePacket<'a> {
    pub fn new(metadata: &'a Metadata, sample: Sample) -> Self {
        SamplePacket {
            name: &metadata.name,
            path: &metadata.path,
            v: sample.v,
            ts: sample.ts,
            unit: &metadata.unit,
        }
    }
}

/// Single-line JSON with a space after every `:` and `,`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn write_packet(buf: &mut Vec<u8>, packet: &SamplePacket) -> Result<(), EncodeError> {
    let mut serializer = Serializer::with_formatter(buf, SpacedFormatter);
    packet.serialize(&mut serializer)?;

    Ok(())
}

/// Encodes packets into a reused buffer, refusing anything longer than its
/// capacity.
#[derive(Debug)]
pub struct PacketEncoder {
    buf: Vec<u8>,
    capacity: usize,
}

impl PacketEncoder {
    /// Encoder sized for the worst case of `metadata`, so it never overflows
    /// on packets carrying those tags.
    pub fn new(metadata: &Metadata) -> Result<Self, EncodeError> {
        Ok(Self::with_capacity(metadata.max_packet_len()?))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PacketEncoder {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn encode(&mut self, packet: &SamplePacket) -> Result<&[u8], EncodeError> {
        self.buf.clear();
        write_packet(&mut self.buf, packet)?;

        let len = self.buf.len();
        if len > self.capacity {
            return Err(EncodeError::Overflow {
                len,
                capacity: self.capacity,
            });
        }

        Ok(&self.buf)
    }
}
