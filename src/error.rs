//! Error types for the fan-out core and the control path.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// An encoder process could not be started for a profile.
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The executable was not found on PATH or at the given path.
    #[error("encoder executable not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The OS refused to start the process.
    #[error("failed to start {}: {source}", .program.display())]
    Start {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stdio pipe was not handed back after spawning.
    #[error("encoder {0} pipe unavailable")]
    Pipe(&'static str),
}

/// Forwarding bytes to an instance failed (broken pipe, process exited).
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("write to {profile} failed: {source}")]
    Io {
        profile: String,
        #[source]
        source: io::Error,
    },

    /// The input channel was already closed.
    #[error("input of {0} is closed")]
    Closed(String),
}

/// Closing an instance failed.
#[derive(Error, Debug)]
pub enum CloseError {
    /// Flushing/closing the input channel failed.
    #[error("closing input of {profile} failed: {source}")]
    Input {
        profile: String,
        #[source]
        source: io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("waiting for {profile} to exit failed: {source}")]
    Wait {
        profile: String,
        #[source]
        source: io::Error,
    },
}

/// Errors reported by a tuner capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TunerError {
    /// Device unreachable or not answering.
    #[error("Connection Error: {0}")]
    Connection(String),

    /// Device refused to start streaming.
    #[error("Failed to tune: {0}")]
    Tune(String),
}

/// Control-path errors surfaced to the operator.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Tuner(#[from] TunerError),

    #[error("UDP Connection Error: {0}")]
    Bind(#[source] io::Error),

    #[error("cannot create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("receiver task failed: {0}")]
    Task(String),

    #[error("Failed to create transcoder {profile}: {source}")]
    Spawn {
        profile: String,
        #[source]
        source: SpawnError,
    },
}

impl Error {
    /// Whether the run must stop, as opposed to continuing degraded.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Spawn { .. } => false,
            Error::Tuner(_) | Error::Bind(_) | Error::OutputDir { .. } | Error::Task(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
