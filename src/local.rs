use std::path::Path;
use std::process::Stdio;

use crate::errors::DeployError;
use crate::services::logger::Logger;
use crate::utils::subst::Substitutions;

/// Run commands on the local machine, fail-fast, with inherited stdio.
///
/// Each command gets `${workspace}` replaced with the workspace path, then
/// the same `${NAME}` substitution the remote materializer uses, and is
/// split on whitespace into program and arguments. A non-zero exit or a
/// spawn failure aborts the remaining commands.
pub(crate) async fn run_local(
    logger: &Logger,
    substitutions: &Substitutions,
    workspace: &Path,
    commands: &[String],
) -> Result<(), DeployError> {
    for raw in commands {
        let command = raw.replace("${workspace}", &workspace.to_string_lossy());
        let command = substitutions.apply(&command);

        logger.info(&format!("[ LOCAL RUN ]: {}", command), None);

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DeployError::config("local command is empty"))?;

        let status = tokio::process::Command::new(program)
            .args(parts)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|err| {
                std::io::Error::new(err.kind(), format!("failed to run '{}': {}", program, err))
            })?;

        if !status.success() {
            return Err(DeployError::command(
                status.code().unwrap_or(-1),
                format!("local command '{}' failed", command),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_local;
    use crate::errors::DeployError;
    use crate::services::logger::Logger;
    use crate::utils::subst::Substitutions;
    use std::path::PathBuf;

    fn tmp_workspace() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deploykit-local-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("workspace dir");
        dir
    }

    #[tokio::test]
    async fn expands_workspace_token() {
        let workspace = tmp_workspace();
        run_local(
            &Logger::new("test"),
            &Substitutions::new(),
            &workspace,
            &["touch ${workspace}/marker".to_string()],
        )
        .await
        .expect("run_local");
        assert!(workspace.join("marker").exists());
        let _ = std::fs::remove_dir_all(&workspace);
    }

    #[tokio::test]
    async fn applies_substitutions_to_arguments() {
        let workspace = tmp_workspace();
        let subs: Substitutions = [("TARGET".to_string(), "built.out".to_string())]
            .into_iter()
            .collect();
        run_local(
            &Logger::new("test"),
            &subs,
            &workspace,
            &["touch ${workspace}/${TARGET}".to_string()],
        )
        .await
        .expect("run_local");
        assert!(workspace.join("built.out").exists());
        let _ = std::fs::remove_dir_all(&workspace);
    }

    #[tokio::test]
    async fn failing_command_aborts_the_rest() {
        let workspace = tmp_workspace();
        let result = run_local(
            &Logger::new("test"),
            &Substitutions::new(),
            &workspace,
            &[
                "false".to_string(),
                "touch ${workspace}/after".to_string(),
            ],
        )
        .await;
        assert!(matches!(result, Err(DeployError::Command { status: 1, .. })));
        assert!(!workspace.join("after").exists());
        let _ = std::fs::remove_dir_all(&workspace);
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let workspace = tmp_workspace();
        let result = run_local(
            &Logger::new("test"),
            &Substitutions::new(),
            &workspace,
            &["deploykit-no-such-program".to_string()],
        )
        .await;
        assert!(matches!(result, Err(DeployError::Io(_))));
        let _ = std::fs::remove_dir_all(&workspace);
    }

    #[tokio::test]
    async fn empty_command_is_config_error() {
        let workspace = tmp_workspace();
        let result = run_local(
            &Logger::new("test"),
            &Substitutions::new(),
            &workspace,
            &["   ".to_string()],
        )
        .await;
        assert!(matches!(result, Err(DeployError::Config(_))));
        let _ = std::fs::remove_dir_all(&workspace);
    }
}
