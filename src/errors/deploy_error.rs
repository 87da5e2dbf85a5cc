use thiserror::Error;

/// Error taxonomy for the deployment core.
///
/// Every failure is surfaced to the immediate caller with enough context
/// (path, command, or file name) to diagnose it. Nothing is retried
/// internally; the first failure terminates the enclosing call.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Duplicate or missing connection parameter.
    #[error("config error: {0}")]
    Config(String),

    /// Key material missing, unreadable, or empty; authentication rejected.
    #[error("auth error: {0}")]
    Auth(String),

    /// Dial or transport handshake failure.
    #[error("connect error: {0}")]
    Connect(String),

    /// Failed to open or use an ephemeral remote session.
    #[error("session error: {0}")]
    Session(String),

    /// Non-Ok acknowledgement or malformed response framing.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Stream read/write failure, including premature stream close.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-zero exit of a remote command batch or local command.
    #[error("command failed with status {status}: {stderr}")]
    Command { status: i32, stderr: String },
}

impl DeployError {
    pub fn config(message: impl Into<String>) -> Self {
        DeployError::Config(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        DeployError::Auth(message.into())
    }

    pub fn connect(message: impl Into<String>) -> Self {
        DeployError::Connect(message.into())
    }

    pub fn session(message: impl Into<String>) -> Self {
        DeployError::Session(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        DeployError::Protocol(message.into())
    }

    pub fn command(status: i32, stderr: impl Into<String>) -> Self {
        DeployError::Command {
            status,
            stderr: stderr.into(),
        }
    }

    /// Stable lowercase kind tag, used for log metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployError::Config(_) => "config",
            DeployError::Auth(_) => "auth",
            DeployError::Connect(_) => "connect",
            DeployError::Session(_) => "session",
            DeployError::Protocol(_) => "protocol",
            DeployError::Io(_) => "io",
            DeployError::Command { .. } => "command",
        }
    }
}
