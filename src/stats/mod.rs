//! Counters for the receive loop and for each live sink

use std::time::Instant;

use crate::constants::{TS_PACKET_SIZE, TS_SYNC_BYTE};

/// Per-sink delivery statistics
#[derive(Debug, Clone)]
pub struct SinkStats {
    pub name: String,
    pub packets: u64,
    pub bytes: u64,
    pub write_errors: u64,
    /// Failed writes since the last successful one
    pub consecutive_failures: u64,
    pub evicted: bool,
    pub start: Instant,
}

impl SinkStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            packets: 0,
            bytes: 0,
            write_errors: 0,
            consecutive_failures: 0,
            evicted: false,
            start: Instant::now(),
        }
    }

    /// Record a successful write; returns how many failures it ended
    pub fn on_write(&mut self, bytes: usize) -> u64 {
        self.packets += 1;
        self.bytes += bytes as u64;
        std::mem::take(&mut self.consecutive_failures)
    }

    /// Record a failed write; returns true for the first of a run
    pub fn on_write_error(&mut self) -> bool {
        self.write_errors += 1;
        self.consecutive_failures += 1;
        self.consecutive_failures == 1
    }

    /// Average delivered rate in kbps since the sink joined the live set
    pub fn calculate_bitrate(&self) -> f64 {
        let seconds = self.start.elapsed().as_secs_f64().max(0.1);
        (self.bytes as f64 * 8.0 / 1000.0) / seconds
    }
}

/// Receive-side statistics
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub datagrams: u64,
    pub bytes: u64,
    pub transient_read_errors: u64,
    /// Datagrams that are not a whole number of sync-aligned TS packets
    pub misaligned_datagrams: u64,
}

impl StreamStats {
    /// Count a datagram; returns false when it is not TS-aligned
    pub fn on_datagram(&mut self, packet: &[u8]) -> bool {
        self.datagrams += 1;
        self.bytes += packet.len() as u64;
        let aligned = is_ts_aligned(packet);
        if !aligned {
            self.misaligned_datagrams += 1;
        }
        aligned
    }
}

/// True when `packet` is one or more whole TS packets, each starting with 0x47
pub fn is_ts_aligned(packet: &[u8]) -> bool {
    !packet.is_empty()
        && packet.len() % TS_PACKET_SIZE == 0
        && packet
            .chunks_exact(TS_PACKET_SIZE)
            .all(|chunk| chunk[0] == TS_SYNC_BYTE)
}
