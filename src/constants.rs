//! Constants shared by the receiver and the encoder command builder

/// Largest datagram read from the socket (one Ethernet MTU)
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// MPEG-TS packet size
pub const TS_PACKET_SIZE: usize = 188;

/// MPEG-TS sync byte
pub const TS_SYNC_BYTE: u8 = 0x47;

/// Segment duration handed to the encoder, in seconds
pub const SEGMENT_SECONDS: u32 = 5;

/// Keyframe interval (frames) for the video encoder
pub const DEFAULT_KEYINT: u32 = 24;

/// Encoder executable searched on PATH by default
pub const DEFAULT_ENCODER_PROGRAM: &str = "ffmpeg";

/// Directory segment files are written to
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Segment file extension
pub const DEFAULT_SEGMENT_EXT: &str = "mp4";

/// Video codec passed to `-c:v`
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Log target used for encoder diagnostic lines
pub const ENCODER_LOG_TARGET: &str = "encoder";
