//! In-process fakes shared by the unit tests

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::{CloseError, SpawnError, TunerError, WriteError};
use crate::sink::PacketSink;
use crate::tuner::{Tuner, TunerClient, TunerDevice};
use crate::types::Profile;

/// Everything a fake sink observed, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write { sink: String, data: Vec<u8> },
    CloseStarted(String),
    CloseFinished(String),
}

#[derive(Debug, Clone, Copy)]
pub enum FailMode {
    Never,
    Always,
    /// Fail this many writes, then recover
    First(u64),
}

pub struct FakeSink {
    name: String,
    events: UnboundedSender<Event>,
    fail: FailMode,
    attempts: u64,
}

impl FakeSink {
    pub fn new(name: &str, events: &UnboundedSender<Event>, fail: FailMode) -> Box<dyn PacketSink> {
        Box::new(Self {
            name: name.to_string(),
            events: events.clone(),
            fail,
            attempts: 0,
        })
    }
}

#[async_trait]
impl PacketSink for FakeSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, packet: &[u8]) -> Result<(), WriteError> {
        self.attempts += 1;
        let fail = match self.fail {
            FailMode::Never => false,
            FailMode::Always => true,
            FailMode::First(n) => self.attempts <= n,
        };
        if fail {
            return Err(WriteError::Io {
                profile: self.name.clone(),
                source: io::Error::from(io::ErrorKind::BrokenPipe),
            });
        }
        let _ = self.events.send(Event::Write {
            sink: self.name.clone(),
            data: packet.to_vec(),
        });
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), CloseError> {
        let _ = self.events.send(Event::CloseStarted(self.name.clone()));
        tokio::time::sleep(Duration::from_millis(5)).await;
        let _ = self.events.send(Event::CloseFinished(self.name.clone()));
        Ok(())
    }
}

/// Spawner that fails for the named profiles, as if their executable were missing
pub fn spawner(
    events: UnboundedSender<Event>,
    broken: &'static [&'static str],
) -> impl FnMut(&Profile) -> Result<Box<dyn PacketSink>, SpawnError> {
    move |profile: &Profile| {
        if broken.contains(&profile.name.as_str()) {
            Err(SpawnError::NotFound(PathBuf::from("/invalid/ffmpeg")))
        } else {
            Ok(FakeSink::new(&profile.name, &events, FailMode::Never))
        }
    }
}

pub fn drain_events(rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Writes seen by one sink, in order
pub fn writes_to(events: &[Event], name: &str) -> Vec<Vec<u8>> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Write { sink, data } if sink == name => Some(data.clone()),
            _ => None,
        })
        .collect()
}

/// Calls made against the fake tuner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunerCall {
    Connect(SocketAddr),
    Stream {
        tuner: u32,
        frequency: u64,
        program: u16,
        destination: SocketAddr,
    },
}

/// Tuner that records calls and, once told to stream, sends `datagrams`
/// to the destination from a local socket.
#[derive(Clone)]
pub struct FakeTuner {
    pub calls: UnboundedSender<TunerCall>,
    pub refuse_connect: bool,
    pub refuse_tune: bool,
    pub datagrams: Vec<Vec<u8>>,
}

#[async_trait]
impl TunerClient for FakeTuner {
    async fn connect(&self, device: SocketAddr) -> Result<Box<dyn TunerDevice>, TunerError> {
        let _ = self.calls.send(TunerCall::Connect(device));
        if self.refuse_connect {
            return Err(TunerError::Connection(format!("{device} unreachable")));
        }
        Ok(Box::new(self.clone()))
    }
}

impl TunerDevice for FakeTuner {
    fn tuner(&self, index: u32) -> Box<dyn Tuner> {
        Box::new(FakeTunerHandle {
            index,
            device: self.clone(),
        })
    }
}

struct FakeTunerHandle {
    index: u32,
    device: FakeTuner,
}

#[async_trait]
impl Tuner for FakeTunerHandle {
    async fn stream(&self, frequency: u64, program: u16, destination: SocketAddr) -> Result<(), TunerError> {
        let _ = self.device.calls.send(TunerCall::Stream {
            tuner: self.index,
            frequency,
            program,
            destination,
        });
        if self.device.refuse_tune {
            return Err(TunerError::Tune("no signal".to_string()));
        }
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0")
            .await
            .map_err(|e| TunerError::Tune(e.to_string()))?;
        for datagram in &self.device.datagrams {
            socket
                .send_to(datagram, destination)
                .await
                .map_err(|e| TunerError::Tune(e.to_string()))?;
        }
        Ok(())
    }
}
