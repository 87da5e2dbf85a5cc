use ssh2::{Channel, Session};

use crate::errors::DeployError;

/// One short-lived remote invocation over an established connection.
///
/// The channel is closed when the session is dropped, whichever path the
/// enclosing call takes.
pub(crate) struct RemoteSession {
    pub(crate) channel: Channel,
}

impl RemoteSession {
    pub(crate) fn open(session: &Session) -> Result<Self, DeployError> {
        let channel = session
            .channel_session()
            .map_err(|err| DeployError::session(format!("failed to open remote session: {}", err)))?;
        Ok(Self { channel })
    }

    pub(crate) fn exec(&mut self, command: &str) -> Result<(), DeployError> {
        self.channel.exec(command).map_err(|err| {
            DeployError::session(format!("failed to start remote invocation: {}", err))
        })
    }

    /// Wait for the remote side to close and report its exit status.
    pub(crate) fn finish(&mut self) -> Result<i32, DeployError> {
        self.channel
            .wait_close()
            .map_err(|err| DeployError::session(format!("failed to close remote session: {}", err)))?;
        self.channel
            .exit_status()
            .map_err(|err| DeployError::session(format!("failed to read exit status: {}", err)))
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        let _ = self.channel.close();
    }
}
