use std::net::{SocketAddr, ToSocketAddrs};

use anyhow::Context;
use clap::Parser;
use dvr_fanout::dvr::{Config, Options, run};
use tokio_util::sync::CancellationToken;

/// Tune a broadcast channel and record it as segmented renditions
#[derive(Parser)]
struct Opt {
    /// Tuner device, <device IP>:<device port>
    #[clap(value_parser = parse_device)]
    device: SocketAddr,

    /// Frequency to tune, in Hz
    frequency: u64,

    /// Program number within the transport stream
    program: u16,
}

fn parse_device(s: &str) -> anyhow::Result<SocketAddr> {
    s.to_socket_addrs()
        .with_context(|| format!("Invalid Address: {s}"))?
        .find(SocketAddr::is_ipv4)
        .with_context(|| format!("Invalid Address: {s} has no IPv4 address"))
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let opt = Opt::parse();

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, closing transcoders");
            ctrl_c.cancel();
        }
    });

    let summary = run(
        Options {
            device: opt.device,
            frequency: opt.frequency,
            program: opt.program,
        },
        Config::default(),
        shutdown,
    )
    .await?;

    println!("{}", summary.to_json()?);
    Ok(())
}
