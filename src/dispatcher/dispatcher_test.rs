use tokio::sync::mpsc;

use super::Dispatcher;
use crate::config::default_profiles;
use crate::error::{Error, SpawnError};
use crate::testing::{Event, FailMode, FakeSink, drain_events, spawner, writes_to};
use crate::types::WriteFailurePolicy;

fn packets(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| vec![i as u8; size]).collect()
}

#[tokio::test]
async fn test_every_instance_sees_every_packet_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (mut dispatcher, failures) =
        Dispatcher::start(&default_profiles(), WriteFailurePolicy::Retain, spawner(tx, &[]));
    assert!(failures.is_empty());
    assert_eq!(dispatcher.names(), ["720p", "540p", "360p"]);

    let sent = packets(10, 1000);
    for packet in &sent {
        assert_eq!(dispatcher.dispatch(packet).await, 3);
    }

    let events = drain_events(&mut rx);
    for name in ["720p", "540p", "360p"] {
        assert_eq!(writes_to(&events, name), sent, "{name}");
    }
}

#[tokio::test]
async fn test_delivery_within_one_packet_follows_set_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (mut dispatcher, _) = Dispatcher::start(&default_profiles(), WriteFailurePolicy::Retain, spawner(tx, &[]));

    dispatcher.dispatch(b"first").await;
    dispatcher.dispatch(b"second").await;

    let order: Vec<(String, Vec<u8>)> = drain_events(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            Event::Write { sink, data } => Some((sink, data)),
            _ => None,
        })
        .collect();
    let expected: Vec<(String, Vec<u8>)> = [b"first".as_slice(), b"second".as_slice()]
        .iter()
        .flat_map(|p| ["720p", "540p", "360p"].map(|n| (n.to_string(), p.to_vec())))
        .collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_spawn_failure_skips_only_that_profile() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (mut dispatcher, failures) =
        Dispatcher::start(&default_profiles(), WriteFailurePolicy::Retain, spawner(tx, &["540p"]));

    assert_eq!(dispatcher.len(), 2);
    assert_eq!(dispatcher.names(), ["720p", "360p"]);
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        Error::Spawn { profile, source: SpawnError::NotFound(_) } if profile == "540p"
    ));
    assert!(!failures[0].is_fatal());

    for packet in packets(4, 188) {
        assert_eq!(dispatcher.dispatch(&packet).await, 2);
    }
    let events = drain_events(&mut rx);
    assert_eq!(writes_to(&events, "720p").len(), 4);
    assert_eq!(writes_to(&events, "360p").len(), 4);
    assert!(writes_to(&events, "540p").is_empty());
}

#[tokio::test]
async fn test_retain_keeps_failing_instance_and_retries() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(WriteFailurePolicy::Retain);
    dispatcher.push(FakeSink::new("720p", &tx, FailMode::Never));
    dispatcher.push(FakeSink::new("540p", &tx, FailMode::Always));
    dispatcher.push(FakeSink::new("360p", &tx, FailMode::Never));

    for packet in packets(5, 1316) {
        assert_eq!(dispatcher.dispatch(&packet).await, 2);
    }
    assert_eq!(dispatcher.len(), 3);

    let events = drain_events(&mut rx);
    assert_eq!(writes_to(&events, "360p").len(), 5);

    let summaries = dispatcher.close_all().await;
    let failing = summaries.iter().find(|s| s.profile == "540p").unwrap();
    assert_eq!(failing.write_errors, 5);
    assert_eq!(failing.packets, 0);
    assert!(!failing.evicted);
}

#[tokio::test]
async fn test_retain_recovers_after_transient_failures() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(WriteFailurePolicy::Retain);
    dispatcher.push(FakeSink::new("720p", &tx, FailMode::First(2)));

    let sent = packets(5, 100);
    for packet in &sent {
        dispatcher.dispatch(packet).await;
    }

    assert_eq!(writes_to(&drain_events(&mut rx), "720p"), sent[2..].to_vec());
    let summaries = dispatcher.close_all().await;
    assert_eq!(summaries[0].write_errors, 2);
    assert_eq!(summaries[0].packets, 3);
}

#[tokio::test]
async fn test_evict_removes_and_closes_failed_instance() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(WriteFailurePolicy::Evict);
    dispatcher.push(FakeSink::new("720p", &tx, FailMode::Never));
    dispatcher.push(FakeSink::new("540p", &tx, FailMode::Always));
    dispatcher.push(FakeSink::new("360p", &tx, FailMode::Never));

    assert_eq!(dispatcher.dispatch(b"a").await, 2);
    assert_eq!(dispatcher.names(), ["720p", "360p"]);
    assert_eq!(dispatcher.dispatch(b"b").await, 2);

    let events = drain_events(&mut rx);
    // 360p still got the packet that 540p failed on.
    assert_eq!(writes_to(&events, "360p"), [b"a".to_vec(), b"b".to_vec()]);
    assert!(events.contains(&Event::CloseFinished("540p".to_string())));

    let summaries = dispatcher.close_all().await;
    let profiles: Vec<_> = summaries.iter().map(|s| s.profile.as_str()).collect();
    assert_eq!(profiles, ["720p", "360p", "540p"]);
    assert!(summaries[2].evicted);
    assert_eq!(summaries[2].write_errors, 1);
}

#[tokio::test]
async fn test_close_all_is_sequential_in_creation_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (dispatcher, _) = Dispatcher::start(&default_profiles(), WriteFailurePolicy::Retain, spawner(tx, &[]));

    let summaries = dispatcher.close_all().await;
    assert_eq!(summaries.len(), 3);

    let expected: Vec<Event> = ["720p", "540p", "360p"]
        .into_iter()
        .flat_map(|n| [Event::CloseStarted(n.to_string()), Event::CloseFinished(n.to_string())])
        .collect();
    assert_eq!(drain_events(&mut rx), expected);
}
