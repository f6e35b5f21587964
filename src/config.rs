//! Run configuration: profiles, encoder settings and fan-out policy

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::constants::*;
use crate::types::{Profile, WriteFailurePolicy};

/// Settings shared by every encoder process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Program name (searched on PATH) or path to the executable
    pub program: PathBuf,
    pub output_dir: PathBuf,
    pub extension: String,
    pub video_codec: String,
    pub keyint: u32,
    pub segment_seconds: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ENCODER_PROGRAM),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            extension: DEFAULT_SEGMENT_EXT.to_string(),
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            keyint: DEFAULT_KEYINT,
            segment_seconds: SEGMENT_SECONDS,
        }
    }
}

/// Everything a tune-and-record run needs besides the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Spawned in this order; the live set keeps it
    pub profiles: Vec<Profile>,
    pub encoder: EncoderConfig,
    pub tuner_index: u32,
    pub write_failure_policy: WriteFailurePolicy,
    /// Receive socket address; an unspecified IP is replaced by the local
    /// address routed toward the device when telling the tuner where to send
    pub bind_addr: SocketAddr,
    /// SO_RCVBUF for the receive socket, OS default when `None`
    pub recv_buffer_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            encoder: EncoderConfig::default(),
            tuner_index: 0,
            write_failure_policy: WriteFailurePolicy::Retain,
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            recv_buffer_size: None,
        }
    }
}

/// 720p, 540p and 360p renditions
pub fn default_profiles() -> Vec<Profile> {
    vec![
        Profile::new("720p", 1500, 1500, 1000, 720),
        Profile::new("540p", 800, 800, 500, 540),
        Profile::new("360p", 400, 400, 400, 360),
    ]
}
