//! Draining of an encoder's diagnostic channel

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::constants::ENCODER_LOG_TARGET;
use crate::types::Diagnostic;

/// Reads `reader` to end-of-stream, calling `emit` once per complete line.
///
/// Fragments are joined until a newline arrives; a trailing partial line
/// is emitted at end-of-stream. A read error other than end-of-stream is
/// emitted as one more record and ends the drain.
pub async fn drain<R, F>(profile: &str, reader: R, mut emit: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(Diagnostic),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => emit(Diagnostic::line(profile, decode_line(&buf))),
            Err(e) => {
                if !buf.is_empty() {
                    emit(Diagnostic::line(profile, decode_line(&buf)));
                }
                emit(Diagnostic::read_error(profile, e.to_string()));
                break;
            }
        }
    }
}

/// Default emitter: one log record per line, prefixed with the profile
pub fn log_diagnostic(diagnostic: &Diagnostic) {
    if diagnostic.read_error {
        log::warn!(target: ENCODER_LOG_TARGET, "{} {}", diagnostic.profile, diagnostic.line);
    } else {
        log::info!(target: ENCODER_LOG_TARGET, "{} {}", diagnostic.profile, diagnostic.line);
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod diagnostics_test;
