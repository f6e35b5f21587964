//! Fan-out of received packets to the live transcoder set

use crate::error::{Error, SpawnError};
use crate::report::SinkSummary;
use crate::sink::PacketSink;
use crate::stats::SinkStats;
use crate::types::{Profile, WriteFailurePolicy};

struct LiveSink {
    sink: Box<dyn PacketSink>,
    stats: SinkStats,
}

/// Ordered set of live sinks.
///
/// Populated once at startup and drained once at shutdown; in between it
/// is only touched by the receive task, so it needs no lock.
pub struct Dispatcher {
    live: Vec<LiveSink>,
    policy: WriteFailurePolicy,
    /// Summaries of sinks evicted after a write failure
    evicted: Vec<SinkSummary>,
}

impl Dispatcher {
    pub fn new(policy: WriteFailurePolicy) -> Self {
        Self {
            live: Vec::new(),
            policy,
            evicted: Vec::new(),
        }
    }

    /// Spawns one sink per profile, in order. Profiles that fail to spawn
    /// are skipped and reported back; the rest proceed.
    pub fn start<F>(profiles: &[Profile], policy: WriteFailurePolicy, mut spawn: F) -> (Self, Vec<Error>)
    where
        F: FnMut(&Profile) -> Result<Box<dyn PacketSink>, SpawnError>,
    {
        let mut dispatcher = Self::new(policy);
        let mut failures = Vec::new();

        for profile in profiles {
            match spawn(profile) {
                Ok(sink) => dispatcher.push(sink),
                Err(source) => failures.push(Error::Spawn {
                    profile: profile.name.clone(),
                    source,
                }),
            }
        }

        (dispatcher, failures)
    }

    /// Appends a sink to the end of the live set
    pub fn push(&mut self, sink: Box<dyn PacketSink>) {
        let stats = SinkStats::new(sink.name());
        self.live.push(LiveSink { sink, stats });
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Names of the live sinks, in set order
    pub fn names(&self) -> Vec<&str> {
        self.live.iter().map(|l| l.sink.name()).collect()
    }

    /// Writes `packet` to every live sink in set order and returns how
    /// many accepted it. A failed write never stops delivery to the rest.
    pub async fn dispatch(&mut self, packet: &[u8]) -> usize {
        let mut delivered = 0;
        let mut i = 0;

        while i < self.live.len() {
            let live = &mut self.live[i];
            let result = live.sink.write(packet).await;
            match result {
                Ok(()) => {
                    let recovered = live.stats.on_write(packet.len());
                    if recovered > 0 {
                        log::info!("{} accepting input again after {} failed writes", live.stats.name, recovered);
                    }
                    delivered += 1;
                }
                Err(e) => {
                    if live.stats.on_write_error() {
                        log::warn!("{}", e);
                    } else {
                        log::debug!("{}", e);
                    }
                    if self.policy == WriteFailurePolicy::Evict {
                        let evicted = self.live.remove(i);
                        self.evict(evicted).await;
                        continue;
                    }
                }
            }
            i += 1;
        }

        delivered
    }

    async fn evict(&mut self, mut live: LiveSink) {
        log::warn!("{} evicted from the live set", live.stats.name);
        live.stats.evicted = true;
        let close_error = live.sink.close().await.err().map(|e| {
            log::warn!("{}", e);
            e.to_string()
        });
        self.evicted.push(SinkSummary::from_stats(&live.stats, close_error));
    }

    /// Closes every live sink in set order, one at a time, each close
    /// returning only once that sink has drained. Evicted sinks are
    /// reported after the ones closed here.
    pub async fn close_all(mut self) -> Vec<SinkSummary> {
        let mut summaries = Vec::with_capacity(self.live.len() + self.evicted.len());

        for live in self.live.drain(..) {
            log::info!("closing {}", live.stats.name);
            let close_error = live.sink.close().await.err().map(|e| {
                log::warn!("{}", e);
                e.to_string()
            });
            summaries.push(SinkSummary::from_stats(&live.stats, close_error));
        }

        summaries.append(&mut self.evicted);
        summaries
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod dispatcher_test;
