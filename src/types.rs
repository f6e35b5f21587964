use std::net::SocketAddr;

/// Named encoder configuration producing one quality rendition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Output-file prefix and log prefix
    pub name: String,
    pub video_bitrate_kbps: u32,
    pub max_rate_kbps: u32,
    pub buffer_size_kbps: u32,
    /// Target height; width follows the source aspect ratio
    pub height: u32,
}

impl Profile {
    pub fn new(
        name: &str,
        video_bitrate_kbps: u32,
        max_rate_kbps: u32,
        buffer_size_kbps: u32,
        height: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            video_bitrate_kbps,
            max_rate_kbps,
            buffer_size_kbps,
            height,
        }
    }

    /// Profile-specific encoder flags, in the order they are passed
    pub fn encoder_args(&self) -> Vec<String> {
        vec![
            "-b:v".into(),
            format!("{}k", self.video_bitrate_kbps),
            "-maxrate".into(),
            format!("{}k", self.max_rate_kbps),
            "-bufsize".into(),
            format!("{}k", self.buffer_size_kbps),
            "-vf".into(),
            format!("scale=-1:{}", self.height),
        ]
    }
}

/// What the dispatcher does with an instance whose write failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteFailurePolicy {
    /// Keep the instance and try again on the next packet
    #[default]
    Retain,
    /// Remove the instance from the live set and close it
    Evict,
}

/// Receiver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    Receiving,
    Draining,
    Stopped,
}

/// One record from an encoder's diagnostic channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub profile: String,
    pub line: String,
    /// Set when the record reports a failed read rather than encoder output
    pub read_error: bool,
}

impl Diagnostic {
    pub fn line(profile: &str, line: String) -> Self {
        Self {
            profile: profile.to_string(),
            line,
            read_error: false,
        }
    }

    pub fn read_error(profile: &str, message: String) -> Self {
        Self {
            profile: profile.to_string(),
            line: message,
            read_error: true,
        }
    }
}

/// What to tune, parsed from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub device: SocketAddr,
    pub frequency: u64,
    pub program: u16,
}
