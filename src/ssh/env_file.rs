use std::collections::BTreeMap;

use ssh2::Session;

use crate::errors::DeployError;
use crate::services::logger::Logger;
use crate::ssh::exec;
use crate::utils::subst::Substitutions;

/// Render an environment mapping to `KEY=VALUE` lines in ascending key
/// order, substituting `${NAME}` tokens in values from the captured mapping.
/// Unresolved tokens are left verbatim.
pub(crate) fn render(env: &BTreeMap<String, String>, substitutions: &Substitutions) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push('=');
        out.push_str(&substitutions.apply(value));
        out.push('\n');
    }
    out
}

/// Materialize the mapping as a remote file via one shell redirection
/// command through the command executor.
///
/// Keys and values are interpolated into a double-quoted shell word without
/// escaping; values containing quotes, `$`, or backticks are interpreted by
/// the remote shell.
pub(crate) fn create_env_file_blocking(
    session: &Session,
    logger: &Logger,
    substitutions: &Substitutions,
    remote_path: &str,
    env: &BTreeMap<String, String>,
) -> Result<(), DeployError> {
    let content = render(env, substitutions);
    exec::run_batch(
        session,
        logger,
        &[format!("echo \"{}\" > {}", content, remote_path)],
    )
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::utils::subst::Substitutions;
    use std::collections::BTreeMap;

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_tokens_in_values() {
        let subs: Substitutions = [("SECRET".to_string(), "abc123".to_string())]
            .into_iter()
            .collect();
        let env = mapping(&[("API_KEY", "${SECRET}")]);
        assert_eq!(render(&env, &subs), "API_KEY=abc123\n");
    }

    #[test]
    fn leaves_unresolved_tokens_verbatim() {
        let env = mapping(&[("API_KEY", "${SECRET}")]);
        assert_eq!(render(&env, &Substitutions::new()), "API_KEY=${SECRET}\n");
    }

    #[test]
    fn orders_keys_ascending() {
        let env = mapping(&[("B", "2"), ("A", "1")]);
        assert_eq!(render(&env, &Substitutions::new()), "A=1\nB=2\n");
    }

    #[test]
    fn empty_mapping_renders_empty_content() {
        assert_eq!(render(&BTreeMap::new(), &Substitutions::new()), "");
    }
}
