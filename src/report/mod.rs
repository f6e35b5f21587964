//! End-of-run summary

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::{SinkStats, StreamStats};

/// Delivery totals for one transcoder instance
#[derive(Debug, Clone, Serialize)]
pub struct SinkSummary {
    pub profile: String,
    pub packets: u64,
    pub bytes: u64,
    pub write_errors: u64,
    pub evicted: bool,
    pub bitrate_kbps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_error: Option<String>,
}

impl SinkSummary {
    pub fn from_stats(stats: &SinkStats, close_error: Option<String>) -> Self {
        Self {
            profile: stats.name.clone(),
            packets: stats.packets,
            bytes: stats.bytes,
            write_errors: stats.write_errors,
            evicted: stats.evicted,
            bitrate_kbps: stats.calculate_bitrate(),
            close_error,
        }
    }
}

/// Complete run report, produced once the receiver is stopped
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub stopped_at: String,
    pub datagrams: u64,
    pub bytes: u64,
    pub transient_read_errors: u64,
    pub misaligned_datagrams: u64,
    /// Instances in creation order
    pub transcoders: Vec<SinkSummary>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, stream: &StreamStats, transcoders: Vec<SinkSummary>) -> Self {
        Self {
            started_at: started_at.to_rfc3339(),
            stopped_at: Utc::now().to_rfc3339(),
            datagrams: stream.datagrams,
            bytes: stream.bytes,
            transient_read_errors: stream.transient_read_errors,
            misaligned_datagrams: stream.misaligned_datagrams,
            transcoders,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
