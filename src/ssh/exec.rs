use std::io::{Read, Write};
use std::time::Duration;

use ssh2::Session;

use crate::errors::DeployError;
use crate::services::logger::Logger;
use crate::ssh::session::RemoteSession;

const MAX_STDERR_CAPTURE_BYTES: usize = 256 * 1024;
const POLL_INTERVAL_MS: u64 = 20;

/// Run an ordered command batch as a single remote invocation.
///
/// All commands are joined with newlines and submitted over one ephemeral
/// session, so there is exactly one exit status for the whole batch. Remote
/// stderr is copied live to the local stderr stream for the lifetime of the
/// session and captured for diagnostics; the drain runs until the remote
/// stream ends and is joined before the session is released. A non-zero exit
/// fails with a command error carrying the captured stderr text.
pub(crate) fn run_batch(
    session: &Session,
    logger: &Logger,
    commands: &[String],
) -> Result<(), DeployError> {
    if commands.is_empty() {
        return Ok(());
    }

    let mut remote = RemoteSession::open(session)?;
    for command in commands {
        logger.info(&format!("[ REMOTE RUN ]: {}", command), None);
    }
    remote.exec(&commands.join("\n"))?;

    session.set_blocking(false);
    let drained = drain_to_eof(&mut remote);
    session.set_blocking(true);

    let stderr_text = drained?;
    let status = remote.finish()?;
    if status != 0 {
        return Err(DeployError::command(status, stderr_text));
    }
    Ok(())
}

/// Multiplex stdout and stderr reads over the non-blocking channel until the
/// remote side signals end-of-stream. Stdout is drained and discarded;
/// stderr is forwarded to the local stderr stream and captured up to a cap.
fn drain_to_eof(remote: &mut RemoteSession) -> Result<String, DeployError> {
    let mut captured: Vec<u8> = Vec::new();
    // Stream 0 is stdout; both handles coexist on one channel.
    let mut stdout_stream = remote.channel.stream(0);
    let mut stderr_stream = remote.channel.stderr();
    let mut local_stderr = std::io::stderr();
    let mut buf = [0u8; 8192];

    loop {
        let mut progressed = false;

        match stdout_stream.read(&mut buf) {
            Ok(n) if n > 0 => progressed = true,
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(err) => {
                return Err(std::io::Error::new(
                    err.kind(),
                    format!("remote stdout read failed: {}", err),
                )
                .into())
            }
        }

        match stderr_stream.read(&mut buf) {
            Ok(n) if n > 0 => {
                let _ = local_stderr.write_all(&buf[..n]);
                let _ = local_stderr.flush();
                let room = MAX_STDERR_CAPTURE_BYTES.saturating_sub(captured.len());
                captured.extend_from_slice(&buf[..n.min(room)]);
                progressed = true;
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(err) => {
                return Err(std::io::Error::new(
                    err.kind(),
                    format!("remote stderr read failed: {}", err),
                )
                .into())
            }
        }

        if remote.channel.eof() {
            break;
        }
        if !progressed {
            std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        }
    }

    Ok(String::from_utf8_lossy(&captured).to_string())
}
