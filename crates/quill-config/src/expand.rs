//! Environment variable and home directory expansion for string settings.

use crate::ConfigError;

/// Expand `${VAR}`, `${VAR:-default}` and a leading `~` in `value`.
///
/// `field` names the setting in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_is_unchanged() {
        assert_eq!(expand_env("out", "output.directory").unwrap(), "out");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env("${QUILL_TEST_SURELY_UNSET:-build}", "output.directory").unwrap();
        assert_eq!(value, "build");
    }

    #[test]
    fn test_set_variable_is_expanded() {
        // PATH is set in every test environment we run in.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env("${PATH}", "output.directory").unwrap(), path);
    }

    #[test]
    fn test_unset_variable_is_error() {
        let err = expand_env("${QUILL_TEST_SURELY_UNSET}", "output.file_stem").unwrap_err();
        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "output.file_stem");
                assert!(message.contains("QUILL_TEST_SURELY_UNSET"));
            }
            other => panic!("expected EnvVar error, got {other:?}"),
        }
    }
}
