//! HDHomeRun devices, controlled through the vendor's `hdhomerun_config`
//! utility rather than by speaking the control protocol directly.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Tuner, TunerClient, TunerDevice};
use crate::error::TunerError;

pub const DEFAULT_CONFIG_PROGRAM: &str = "hdhomerun_config";

#[derive(Debug, Clone)]
pub struct HdHomeRunClient {
    program: Arc<PathBuf>,
}

impl HdHomeRunClient {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_CONFIG_PROGRAM)
    }

    /// Use a specific `hdhomerun_config` executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Arc::new(program.into()),
        }
    }
}

impl Default for HdHomeRunClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TunerClient for HdHomeRunClient {
    async fn connect(&self, device: SocketAddr) -> Result<Box<dyn TunerDevice>, TunerError> {
        // hdhomerun_config addresses devices by IP; the control port is fixed.
        let ip = device.ip();
        let model = run_config(&self.program, ip, &["get", "/sys/model"])
            .await
            .map_err(TunerError::Connection)?;
        log::info!("connected to {} ({})", ip, model);

        Ok(Box::new(HdHomeRunDevice {
            program: Arc::clone(&self.program),
            ip,
        }))
    }
}

struct HdHomeRunDevice {
    program: Arc<PathBuf>,
    ip: IpAddr,
}

impl TunerDevice for HdHomeRunDevice {
    fn tuner(&self, index: u32) -> Box<dyn Tuner> {
        Box::new(HdHomeRunTuner {
            program: Arc::clone(&self.program),
            ip: self.ip,
            index,
        })
    }
}

struct HdHomeRunTuner {
    program: Arc<PathBuf>,
    ip: IpAddr,
    index: u32,
}

impl HdHomeRunTuner {
    async fn set(&self, item: &str, value: &str) -> Result<(), TunerError> {
        let key = format!("/tuner{}/{}", self.index, item);
        log::debug!("{} set {} {}", self.ip, key, value);
        run_config(&self.program, self.ip, &["set", &key, value])
            .await
            .map(|_| ())
            .map_err(TunerError::Tune)
    }
}

#[async_trait]
impl Tuner for HdHomeRunTuner {
    async fn stream(&self, frequency: u64, program: u16, destination: SocketAddr) -> Result<(), TunerError> {
        self.set("channel", &format!("auto:{frequency}")).await?;
        self.set("program", &program.to_string()).await?;
        self.set("target", &format!("udp://{destination}")).await?;
        log::info!(
            "tuner{} streaming {} Hz program {} to {}",
            self.index,
            frequency,
            program,
            destination
        );
        Ok(())
    }
}

/// Runs one `hdhomerun_config <ip> <args..>` and returns its reply.
async fn run_config(program: &Path, ip: IpAddr, args: &[&str]) -> Result<String, String> {
    let output = Command::new(program)
        .arg(ip.to_string())
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| format!("cannot run {}: {}", program.display(), e))?;

    check_reply(
        output.status.success(),
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    )
}

/// `hdhomerun_config` reports most failures on stdout with an `ERROR`
/// prefix and a zero exit status.
fn check_reply(success: bool, stdout: &str, stderr: &str) -> Result<String, String> {
    let reply = stdout.trim();
    if !success || reply.starts_with("ERROR") {
        let message = [reply, stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(": ");
        return Err(if message.is_empty() {
            "hdhomerun_config failed".to_string()
        } else {
            message
        });
    }
    Ok(reply.to_string())
}

#[cfg(test)]
#[path = "hdhomerun_test.rs"]
mod hdhomerun_test;
