// src/lib.rs
pub mod dvr {
    use tokio_util::sync::CancellationToken;

    pub use crate::config::{Config, EncoderConfig, default_profiles};
    pub use crate::error::Error;
    pub use crate::report::RunSummary;
    pub use crate::types::{Options, Profile, ReceiverState, WriteFailurePolicy};

    /// Async entry-point; returns once every transcoder has been closed
    /// (after `shutdown` fires or the receive socket is torn down)
    pub async fn run(opts: Options, config: Config, shutdown: CancellationToken) -> Result<RunSummary, Error> {
        let client = crate::tuner::HdHomeRunClient::new();
        crate::core::run(&opts, &config, &client, shutdown).await
    }
}

pub mod config;
pub mod constants;
pub mod core;
pub mod dispatcher;
pub mod error;
pub mod network;
pub mod receiver;
pub mod report;
pub mod sink;
pub mod stats;
pub mod transcoder;
pub mod tuner;
pub mod types;

#[cfg(test)]
mod testing;
