//! Encoder process ownership: spawning, input forwarding, shutdown

pub mod diagnostics;

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::config::EncoderConfig;
use crate::error::{CloseError, SpawnError, WriteError};
use crate::sink::PacketSink;
use crate::types::{Diagnostic, Profile};

/// Program plus the full argument vector for one encoder process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EncoderCommand {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Baseline flags, then the profile's rate/scale flags, then segmentation
    pub fn for_profile(encoder: &EncoderConfig, profile: &Profile) -> Self {
        let keyint = encoder.keyint;
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            "pipe:".into(),
            "-c:a".into(),
            "copy".into(),
            "-c:v".into(),
            encoder.video_codec.clone(),
            "-x264opts".into(),
            format!("keyint={keyint}:min-keyint={keyint}:no-scenecut"),
        ];
        args.extend(profile.encoder_args());
        args.extend([
            "-f".into(),
            "segment".into(),
            "-segment_time".into(),
            encoder.segment_seconds.to_string(),
            output_pattern(encoder, profile).to_string_lossy().into_owned(),
        ]);

        Self {
            program: encoder.program.clone(),
            args,
        }
    }
}

/// `<output_dir>/<prefix>-%04d.<ext>`
pub fn output_pattern(encoder: &EncoderConfig, profile: &Profile) -> PathBuf {
    encoder
        .output_dir
        .join(format!("{}-%04d.{}", profile.name, encoder.extension))
}

/// Resolves `program` the way a shell would: names are searched on PATH,
/// anything with a directory component must exist as given.
pub fn locate_program(program: &Path) -> Result<PathBuf, SpawnError> {
    let not_found = || SpawnError::NotFound(program.to_path_buf());

    if program.components().count() > 1 || program.is_absolute() {
        return if is_executable(program) {
            Ok(program.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let path = env::var_os("PATH").ok_or_else(not_found)?;
    let with_suffix = format!("{}{}", program.display(), env::consts::EXE_SUFFIX);
    env::split_paths(&path)
        .flat_map(|dir| [dir.join(program), dir.join(&with_suffix)])
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// One running encoder process and its diagnostics drain
pub struct Transcoder {
    profile: String,
    child: Child,
    stdin: Option<ChildStdin>,
    drain: JoinHandle<()>,
}

impl Transcoder {
    /// Starts the encoder for `profile` as configured by `encoder`.
    pub fn for_profile(
        encoder: &EncoderConfig,
        profile: &Profile,
        tap: Option<UnboundedSender<Diagnostic>>,
    ) -> Result<Self, SpawnError> {
        Self::spawn(&profile.name, &EncoderCommand::for_profile(encoder, profile), tap)
    }

    /// Starts `command` and its diagnostics drain. Every diagnostic line is
    /// logged; `tap`, when given, also receives a copy.
    pub fn spawn(
        profile: &str,
        command: &EncoderCommand,
        tap: Option<UnboundedSender<Diagnostic>>,
    ) -> Result<Self, SpawnError> {
        let program = locate_program(&command.program)?;
        log::info!("{} Command Args: {}", profile, command.args.join(" "));

        let mut child = Command::new(&program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Start { program: program.clone(), source })?;

        let stdin = child.stdin.take().ok_or(SpawnError::Pipe("stdin"))?;
        let stderr = child.stderr.take().ok_or(SpawnError::Pipe("stderr"))?;

        let name = profile.to_string();
        let drain = tokio::spawn(async move {
            diagnostics::drain(&name, stderr, |d| {
                diagnostics::log_diagnostic(&d);
                if let Some(tap) = &tap {
                    let _ = tap.send(d);
                }
            })
            .await;
            log::debug!("{} diagnostics reached end of stream", name);
        });

        log::debug!("{} spawned pid {:?}", profile, child.id());
        Ok(Self {
            profile: profile.to_string(),
            child,
            stdin: Some(stdin),
            drain,
        })
    }
}

#[async_trait]
impl PacketSink for Transcoder {
    fn name(&self) -> &str {
        &self.profile
    }

    async fn write(&mut self, packet: &[u8]) -> Result<(), WriteError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| WriteError::Closed(self.profile.clone()))?;
        stdin.write_all(packet).await.map_err(|source| WriteError::Io {
            profile: self.profile.clone(),
            source,
        })
    }

    /// Closing stdin is the encoder's cue to finish its last segment and
    /// exit. There is no timeout: a hung encoder hangs this call.
    async fn close(self: Box<Self>) -> Result<(), CloseError> {
        let Transcoder {
            profile,
            mut child,
            stdin,
            drain,
        } = *self;

        let closed = match stdin {
            Some(mut stdin) => stdin.flush().await,
            None => Ok(()),
        };

        if let Err(e) = drain.await {
            log::error!("{} diagnostics task failed: {}", profile, e);
        }

        close_result(profile, closed, child.wait().await)
    }
}

/// An input-close error is reported ahead of a failed wait.
fn close_result(profile: String, input: io::Result<()>, exit: io::Result<ExitStatus>) -> Result<(), CloseError> {
    match exit {
        Ok(status) if status.success() => log::info!("{} encoder exited", profile),
        Ok(status) => log::warn!("{} encoder exited with {}", profile, status),
        Err(e) if input.is_err() => log::error!("{} wait failed: {}", profile, e),
        Err(source) => return Err(CloseError::Wait { profile, source }),
    }
    input.map_err(|source| CloseError::Input { profile, source })
}
