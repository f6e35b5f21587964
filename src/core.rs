use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result, SpawnError};
use crate::network::destination_endpoint;
use crate::receiver::Receiver;
use crate::report::RunSummary;
use crate::sink::PacketSink;
use crate::transcoder::Transcoder;
use crate::tuner::TunerClient;
use crate::types::{Options, Profile};

/// Production run: one `Transcoder` per configured profile.
pub async fn run(
    options: &Options,
    config: &Config,
    client: &dyn TunerClient,
    shutdown: CancellationToken,
) -> Result<RunSummary> {
    let output_dir = &config.encoder.output_dir;
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| Error::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

    let encoder = config.encoder.clone();
    run_with(options, config, client, shutdown, move |profile| {
        Transcoder::for_profile(&encoder, profile, None).map(|t| Box::new(t) as Box<dyn PacketSink>)
    })
    .await
}

/// Connect, bind, spawn, tune, then receive until `shutdown` fires or the
/// socket is torn down. Sinks come from `spawn`, one call per profile.
pub async fn run_with<F>(
    options: &Options,
    config: &Config,
    client: &dyn TunerClient,
    shutdown: CancellationToken,
    spawn: F,
) -> Result<RunSummary>
where
    F: FnMut(&Profile) -> std::result::Result<Box<dyn PacketSink>, SpawnError>,
{
    let device = client.connect(options.device).await?;

    let receiver = Receiver::bind(config.bind_addr, config.recv_buffer_size).map_err(Error::Bind)?;
    let destination = receiver
        .local_addr()
        .and_then(|bound| destination_endpoint(options.device, bound))
        .map_err(Error::Bind)?;
    log::info!("receiving on {}", destination);

    let (dispatcher, failures) = Dispatcher::start(&config.profiles, config.write_failure_policy, spawn);
    for failure in failures {
        handle(failure)?;
    }
    log::info!("{} of {} transcoders running", dispatcher.len(), config.profiles.len());

    let receive = tokio::spawn(receiver.run(dispatcher, shutdown.clone()));

    let tuned = device
        .tuner(config.tuner_index)
        .stream(options.frequency, options.program, destination)
        .await;
    if let Err(e) = tuned {
        // Encoders are already running; let them finish cleanly first.
        shutdown.cancel();
        if let Err(join) = receive.await {
            log::error!("receiver task failed: {}", join);
        }
        return Err(e.into());
    }

    receive.await.map_err(|e| Error::Task(e.to_string()))
}

/// Single place deciding whether a failure stops the run.
fn handle(err: Error) -> Result<()> {
    if err.is_fatal() {
        return Err(err);
    }
    log::warn!("{}", err);
    Ok(())
}

#[cfg(test)]
#[path = "core_test.rs"]
mod core_test;
