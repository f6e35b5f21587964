//! The write-side endpoint the dispatcher fans packets out to

use async_trait::async_trait;

use crate::error::{CloseError, WriteError};

/// A consumer of stream packets.
///
/// `write` is awaited in the receive task, so a sink that blocks delays
/// every sink after it and the next socket read. `close` is the only
/// shutdown signal a sink gets.
#[async_trait]
pub trait PacketSink: Send {
    /// Profile name, used for logging and reporting
    fn name(&self) -> &str;

    async fn write(&mut self, packet: &[u8]) -> Result<(), WriteError>;

    /// Close the input side and wait until the sink has fully drained
    async fn close(self: Box<Self>) -> Result<(), CloseError>;
}
