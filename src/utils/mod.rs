pub mod subst;
pub mod user_paths;

/// Single-quote a value for safe interpolation into a remote shell command.
pub(crate) fn escape_shell_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::escape_shell_value;

    #[test]
    fn quotes_plain_values() {
        assert_eq!(escape_shell_value("/opt/app"), "'/opt/app'");
    }

    #[test]
    fn escapes_embedded_single_quotes() {
        assert_eq!(escape_shell_value("it's"), "'it'\\''s'");
    }
}
