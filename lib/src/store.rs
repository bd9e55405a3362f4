//! The ordered, append-only store of decoded packets for one capture
//! session, with capture-file persistence
//!
//! Persisted captures are a length-prefixed stream of [`PacketRecord`]
//! values. Import re-dissects every record from its raw bytes, so a capture
//! file written by an older build reproduces summaries with the current
//! dissection logic.

use log::warn;
use std::io::{Read, Write};

use crate::{
    dissect,
    error::{RWireLibError, Result},
    filter::Predicate,
    packet::{DecodedPacket, PacketRecord},
};

const CAPTURE_MAGIC: &[u8; 8] = b"RWIRECAP";

// no encoded record of a single frame comes anywhere near this; a larger
// length prefix means a corrupted file
const MAX_RECORD_LEN: u32 = 16 * 1024 * 1024;

/// The ordered sequence of decoded packets for the current capture session
#[derive(Debug, Default)]
pub struct PacketStore {
    packets: Vec<DecodedPacket>,
}

impl PacketStore {
    /// Returns a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decoded packet to the store
    pub fn push(&mut self, packet: DecodedPacket) {
        self.packets.push(packet);
    }

    /// Returns the number of stored packets
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Returns true when the store holds no packets
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Removes all stored packets
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Returns the stored packets in arrival order
    pub fn packets(&self) -> &[DecodedPacket] {
        &self.packets
    }

    /// Returns a non-destructive filtered view of the store
    ///
    /// The store itself is never mutated by filtering; recompiling and
    /// reapplying a predicate always starts from the full sequence.
    pub fn filtered(&self, predicate: &Predicate) -> Vec<DecodedPacket> {
        self.packets
            .iter()
            .filter(|packet| predicate.matches(packet))
            .cloned()
            .collect()
    }

    /// Writes the store as a persisted capture to `writer`
    ///
    /// Only [`PacketRecord`] fields are written; derived summary fields are
    /// never persisted.
    pub fn export<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(CAPTURE_MAGIC)?;
        writer.write_all(&(self.packets.len() as u32).to_be_bytes())?;

        for packet in self.packets.iter() {
            let record = PacketRecord::from(packet);
            let encoded = serde_json::to_vec(&record)?;
            writer.write_all(&(encoded.len() as u32).to_be_bytes())?;
            writer.write_all(&encoded)?;
        }

        writer.flush()?;

        Ok(())
    }

    /// Reads a persisted capture from `reader` into a new store
    ///
    /// Every record is re-dissected from its raw bytes and link type. A
    /// record the current dissector no longer accepts is skipped with a
    /// warning, mirroring the drop-and-continue policy of live capture.
    pub fn import<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;

        if &magic != CAPTURE_MAGIC {
            return Err(RWireLibError::CaptureFile(
                "not a capture file".into(),
            ));
        }

        let mut count_buf = [0u8; 4];
        reader.read_exact(&mut count_buf)?;
        let count = u32::from_be_bytes(count_buf);

        let mut store = Self::new();

        for _ in 0..count {
            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf)?;

            let record_len = u32::from_be_bytes(len_buf);

            if record_len > MAX_RECORD_LEN {
                return Err(RWireLibError::CaptureFile(format!(
                    "record length {} exceeds maximum of {}",
                    record_len, MAX_RECORD_LEN
                )));
            }

            let mut encoded = vec![0u8; record_len as usize];
            reader.read_exact(&mut encoded)?;

            let record: PacketRecord = serde_json::from_slice(&encoded)?;

            match dissect::dissect_record(&record) {
                Ok(packet) => store.push(packet),
                Err(e) => {
                    warn!("skipping record {}: {}", record.sequence, e);
                }
            }
        }

        Ok(store)
    }
}

#[cfg(test)]
#[path = "./store_tests.rs"]
mod tests;
