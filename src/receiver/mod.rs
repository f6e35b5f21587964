//! Datagram receive loop driving the dispatcher

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use chrono::Utc;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::constants::MAX_DATAGRAM_SIZE;
use crate::dispatcher::Dispatcher;
use crate::network::create_udp_socket;
use crate::report::RunSummary;
use crate::stats::StreamStats;
use crate::types::ReceiverState;

/// Where datagrams come from
#[async_trait]
pub trait DatagramSource: Send + Sync {
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Appends one datagram of at most `MAX_DATAGRAM_SIZE` bytes to `buf`
    /// and returns its sender.
    async fn recv_datagram(&self, buf: &mut BytesMut) -> io::Result<SocketAddr>;
}

#[async_trait]
impl DatagramSource for UdpSocket {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }

    async fn recv_datagram(&self, buf: &mut BytesMut) -> io::Result<SocketAddr> {
        let mut dst = buf.limit(MAX_DATAGRAM_SIZE);
        let (_, from) = self.recv_buf_from(&mut dst).await?;
        Ok(from)
    }
}

/// Owns the socket the tuner streams into.
///
/// `Idle → Receiving` on bind; a terminal read error or `shutdown`
/// moves it to `Draining`, and it is `Stopped` once every sink is closed.
pub struct Receiver<S = UdpSocket> {
    source: S,
    state: watch::Sender<ReceiverState>,
    started_at: chrono::DateTime<Utc>,
}

impl Receiver {
    /// Binds `addr` and enters `Receiving`. Needs a tokio runtime.
    pub fn bind(addr: SocketAddr, recv_buffer_size: Option<usize>) -> io::Result<Self> {
        let socket = create_udp_socket(addr, recv_buffer_size)?;
        Ok(Self::from_source(UdpSocket::from_std(socket.into())?))
    }
}

impl<S: DatagramSource> Receiver<S> {
    /// Wraps an already open source and enters `Receiving`.
    pub fn from_source(source: S) -> Self {
        let (state, _) = watch::channel(ReceiverState::Idle);
        let receiver = Self {
            source,
            state,
            started_at: Utc::now(),
        };
        receiver.transition(ReceiverState::Receiving);
        receiver
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.source.local_addr()
    }

    pub fn state(&self) -> ReceiverState {
        *self.state.borrow()
    }

    /// Watch state transitions from another task
    pub fn subscribe(&self) -> watch::Receiver<ReceiverState> {
        self.state.subscribe()
    }

    fn transition(&self, next: ReceiverState) {
        log::info!("receiver: {:?} -> {:?}", self.state(), next);
        self.state.send_replace(next);
    }

    /// Reads datagrams and fans each one out until the socket is torn
    /// down or `shutdown` fires, then closes every sink in order.
    pub async fn run(self, mut dispatcher: Dispatcher, shutdown: CancellationToken) -> RunSummary {
        let mut stats = StreamStats::default();
        let mut buf = BytesMut::with_capacity(MAX_DATAGRAM_SIZE);

        if dispatcher.is_empty() {
            log::warn!("no transcoders running, received datagrams are discarded");
        }

        loop {
            buf.clear();
            buf.reserve(MAX_DATAGRAM_SIZE);

            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                result = self.source.recv_datagram(&mut buf) => Some(result),
            };
            let Some(result) = result else {
                log::info!("receive socket closed");
                break;
            };

            match result {
                Ok(from) => {
                    let packet = buf.split().freeze();
                    if !stats.on_datagram(&packet) && stats.misaligned_datagrams == 1 {
                        log::warn!(
                            "datagram of {} bytes from {} is not aligned to TS packets",
                            packet.len(),
                            from
                        );
                    }
                    dispatcher.dispatch(&packet).await;
                }
                Err(e) if is_transient(&e) => {
                    stats.transient_read_errors += 1;
                    log::warn!("receive error: {}", e);
                }
                Err(e) => {
                    log::info!("receive socket torn down: {}", e);
                    break;
                }
            }
        }

        self.transition(ReceiverState::Draining);
        let transcoders = dispatcher.close_all().await;
        self.transition(ReceiverState::Stopped);

        RunSummary::new(self.started_at, &stats, transcoders)
    }
}

/// Read errors the loop logs and continues past
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
    )
}
