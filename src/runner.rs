use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::local;
use crate::services::logger::Logger;
use crate::ssh::{copy, env_file, exec, Connection};
use crate::utils::subst::Substitutions;

/// The deployment surface: remote command batches, file copies, environment
/// file materialization, and local command runs.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run the commands as one remote invocation with a single exit status.
    async fn run_remote(&self, commands: &[String]) -> Result<(), DeployError>;

    /// Copy files under `workspace` into `remote_path` on the remote host.
    async fn copy_files(
        &self,
        permissions: &str,
        remote_path: &str,
        workspace: &Path,
        files: &[String],
    ) -> Result<(), DeployError>;

    /// Materialize the mapping as a remote environment file.
    async fn create_env_file(
        &self,
        remote_path: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<(), DeployError>;

    /// Run the commands on the local machine with the same substitution
    /// rules, no transport involved.
    async fn run_local(&self, workspace: &Path, commands: &[String]) -> Result<(), DeployError>;
}

/// Runner backed by one authenticated SSH connection.
///
/// The substitution mapping is captured at construction; materialization and
/// local runs never scan the process environment afterwards. Calls are
/// serialized over the connection; each moves its blocking SSH work onto one
/// short-lived background task joined before the call returns.
pub struct DeployRunner {
    connection: Connection,
    substitutions: Substitutions,
    logger: Logger,
}

impl DeployRunner {
    /// Build a runner that substitutes from a snapshot of the current
    /// process environment.
    pub fn new(connection: Connection) -> Self {
        Self::with_substitutions(connection, Substitutions::from_process_env())
    }

    pub fn with_substitutions(connection: Connection, substitutions: Substitutions) -> Self {
        Self {
            connection,
            substitutions,
            logger: Logger::new("deploykit"),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Tear down the underlying connection; later calls fail with a session
    /// error.
    pub async fn close(&self) -> Result<(), DeployError> {
        self.connection.close().await
    }

    async fn on_connection<F>(&self, task: F) -> Result<(), DeployError>
    where
        F: FnOnce(&ssh2::Session, &Logger) -> Result<(), DeployError> + Send + 'static,
    {
        let connection = self.connection.clone();
        let logger = self.logger.clone();
        tokio::task::spawn_blocking(move || {
            let guard = connection.lock()?;
            task(&guard.session, &logger)
        })
        .await
        .map_err(|err| DeployError::session(format!("ssh task failed: {}", err)))?
    }
}

#[async_trait]
impl Runner for DeployRunner {
    async fn run_remote(&self, commands: &[String]) -> Result<(), DeployError> {
        let commands = commands.to_vec();
        self.on_connection(move |session, logger| exec::run_batch(session, logger, &commands))
            .await
    }

    async fn copy_files(
        &self,
        permissions: &str,
        remote_path: &str,
        workspace: &Path,
        files: &[String],
    ) -> Result<(), DeployError> {
        let permissions = permissions.to_string();
        let remote_path = remote_path.to_string();
        let workspace: PathBuf = workspace.to_path_buf();
        let files = files.to_vec();
        self.on_connection(move |session, logger| {
            copy::copy_files_blocking(
                session,
                logger,
                &permissions,
                &remote_path,
                &workspace,
                &files,
            )
        })
        .await
    }

    async fn create_env_file(
        &self,
        remote_path: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<(), DeployError> {
        let remote_path = remote_path.to_string();
        let env = env.clone();
        let substitutions = self.substitutions.clone();
        self.on_connection(move |session, logger| {
            env_file::create_env_file_blocking(session, logger, &substitutions, &remote_path, &env)
        })
        .await
    }

    async fn run_local(&self, workspace: &Path, commands: &[String]) -> Result<(), DeployError> {
        local::run_local(&self.logger, &self.substitutions, workspace, commands).await
    }
}

#[cfg(test)]
mod tests {
    use super::{DeployRunner, Runner};
    use crate::errors::DeployError;
    use crate::ssh::Connection;
    use crate::utils::subst::Substitutions;
    use std::path::Path;

    fn detached_runner() -> DeployRunner {
        let session = ssh2::Session::new().expect("detached session");
        let connection = Connection::from_session(session, "test:22".to_string());
        DeployRunner::with_substitutions(connection, Substitutions::new())
    }

    #[tokio::test]
    async fn remote_calls_after_close_fail_with_session_error() {
        let runner = detached_runner();
        runner.close().await.expect("close");
        let result = runner.run_remote(&["true".to_string()]).await;
        assert!(matches!(result, Err(DeployError::Session(_))));
    }

    #[tokio::test]
    async fn copy_after_close_fails_with_session_error() {
        let runner = detached_runner();
        runner.close().await.expect("close");
        let result = runner
            .copy_files("0644", "/tmp/dest", Path::new("/tmp"), &["a.txt".to_string()])
            .await;
        assert!(matches!(result, Err(DeployError::Session(_))));
    }

    #[tokio::test]
    async fn empty_remote_batch_is_a_no_op() {
        // No session is opened for an empty batch, so even a detached
        // connection succeeds.
        let runner = detached_runner();
        runner.run_remote(&[]).await.expect("empty batch");
    }
}
