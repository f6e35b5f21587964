//! Tuner control capability consumed by the core
//!
//! The core only needs three calls: reach the device, pick a tuner, and
//! tell that tuner where to stream. Implementations live behind these
//! traits so a run can be driven by a fake device.

pub mod hdhomerun;

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::TunerError;

pub use hdhomerun::HdHomeRunClient;

/// Connects to tuner devices
#[async_trait]
pub trait TunerClient: Send + Sync {
    async fn connect(&self, device: SocketAddr) -> Result<Box<dyn TunerDevice>, TunerError>;
}

/// A connected device exposing numbered tuners
pub trait TunerDevice: Send + Sync {
    fn tuner(&self, index: u32) -> Box<dyn Tuner>;
}

/// One tuner on a device
#[async_trait]
pub trait Tuner: Send + Sync {
    /// Tune `frequency` (Hz), select `program`, and send the transport
    /// stream to `destination` over UDP.
    async fn stream(&self, frequency: u64, program: u16, destination: SocketAddr) -> Result<(), TunerError>;
}
