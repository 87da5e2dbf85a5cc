use std::io::{Read, Write};
use std::path::Path;

use ssh2::Session;

use crate::errors::DeployError;
use crate::services::logger::Logger;
use crate::ssh::response::check_response;
use crate::ssh::session::RemoteSession;
use crate::ssh::exec;
use crate::utils::escape_shell_value;

/// One file-copy handshake: permission string, declared byte size, target
/// filename, and the byte source. Exactly `size` bytes must be streamed
/// before the terminator.
pub struct CopyRequest<R> {
    pub permissions: String,
    pub size: u64,
    pub filename: String,
    pub source: R,
}

/// Run the three-phase copy handshake against a remote receiver.
///
/// Phase one writes the header line `C<permissions> <size> <filename>\n` and
/// awaits an acknowledgement. Phase two streams exactly `size` bytes of
/// content. Phase three sends the single NUL terminator and awaits the
/// second acknowledgement. The transport is generic so the handshake can be
/// exercised against an in-memory stream.
pub fn send_file<T, R>(transport: &mut T, request: &mut CopyRequest<R>) -> Result<(), DeployError>
where
    T: Read + Write,
    R: Read,
{
    write!(
        transport,
        "C{} {} {}\n",
        request.permissions, request.size, request.filename
    )?;
    transport.flush()?;
    check_response(transport)?;

    let copied = std::io::copy(&mut (&mut request.source).take(request.size), transport)?;
    if copied != request.size {
        return Err(DeployError::protocol(format!(
            "file '{}' declared {} bytes but the source produced {}",
            request.filename, request.size, copied
        )));
    }

    transport.write_all(&[0x00])?;
    transport.flush()?;
    check_response(transport)
}

/// Copy local files under `workspace` into `remote_dir` on the remote host.
///
/// The destination directory is created first with one `mkdir -p` batch.
/// Files are then copied sequentially, each over its own session running the
/// remote copy sink. Any stat/open failure, handshake failure, or abnormal
/// sink exit aborts the whole call; files already copied are not rolled
/// back.
pub(crate) fn copy_files_blocking(
    session: &Session,
    logger: &Logger,
    permissions: &str,
    remote_dir: &str,
    workspace: &Path,
    files: &[String],
) -> Result<(), DeployError> {
    exec::run_batch(
        session,
        logger,
        &[format!("mkdir -p {}", escape_shell_value(remote_dir))],
    )?;

    for relative in files {
        let local_path = workspace.join(relative);
        let metadata = std::fs::metadata(&local_path).map_err(|err| {
            std::io::Error::new(
                err.kind(),
                format!("failed to stat '{}': {}", local_path.display(), err),
            )
        })?;
        let source = std::fs::File::open(&local_path).map_err(|err| {
            std::io::Error::new(
                err.kind(),
                format!("failed to open '{}': {}", local_path.display(), err),
            )
        })?;

        let filename = local_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                DeployError::config(format!("'{}' has no file name", local_path.display()))
            })?;
        let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), filename);

        logger.info(
            &format!(
                "[ COPY FILE ]: '{}' -> '{}': {} bytes",
                local_path.display(),
                remote_path,
                metadata.len()
            ),
            None,
        );

        let mut request = CopyRequest {
            permissions: permissions.to_string(),
            size: metadata.len(),
            filename,
            source,
        };
        copy_to_remote(session, &remote_path, &mut request)?;
    }

    Ok(())
}

/// Start the remote sink for one destination path and join both outcomes:
/// the handshake result and the sink's own exit status.
fn copy_to_remote<R: Read>(
    session: &Session,
    remote_path: &str,
    request: &mut CopyRequest<R>,
) -> Result<(), DeployError> {
    let mut remote = RemoteSession::open(session)?;
    remote.exec(&format!(
        "/usr/bin/scp -qt {}",
        escape_shell_value(remote_path)
    ))?;

    let handshake = send_file(&mut remote.channel, request);
    let _ = remote.channel.send_eof();
    let finished = remote.finish();

    handshake?;
    let status = finished?;
    if status != 0 {
        return Err(DeployError::command(
            status,
            format!("remote copy sink for '{}' exited abnormally", remote_path),
        ));
    }
    Ok(())
}
