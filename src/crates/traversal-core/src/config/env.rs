//! Environment variable loading helpers

use crate::error::{Result, TraversalError};
use std::env;
use std::str::FromStr;

/// Read an environment variable
///
/// * `Ok(Some(value))` if the variable is set
/// * `Ok(None)` if it is not set
/// * `Err` if it is set but not valid UTF-8
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(TraversalError::Configuration(format!(
            "Environment variable {} contains invalid UTF-8",
            key
        ))),
    }
}

/// Read and parse an environment variable
///
/// ```rust,ignore
/// let level: Option<QueryLogLevel> = get_env_parse("TRAVERSAL_QUERY_LOG_LEVEL")?;
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => {
            let parsed = val.trim().parse::<T>().map_err(|e| {
                TraversalError::Configuration(format!(
                    "Failed to parse environment variable {}: {}",
                    key, e
                ))
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Prefixed variable name: `build_env_key("TRAVERSAL_", "projection")` is
/// `TRAVERSAL_PROJECTION`
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_missing() {
        assert!(get_env("TRAVERSAL_TEST_MISSING_VAR_12345").unwrap().is_none());
    }

    #[test]
    fn test_get_env_parse() {
        env::set_var("TRAVERSAL_TEST_NUMBER", " 42 ");
        let value: Option<u16> = get_env_parse("TRAVERSAL_TEST_NUMBER").unwrap();
        assert_eq!(value, Some(42));
        env::remove_var("TRAVERSAL_TEST_NUMBER");
    }

    #[test]
    fn test_get_env_parse_invalid() {
        env::set_var("TRAVERSAL_TEST_INVALID_NUMBER", "not_a_number");
        let result: Result<Option<u16>> = get_env_parse("TRAVERSAL_TEST_INVALID_NUMBER");
        assert!(matches!(result, Err(TraversalError::Configuration(_))));
        env::remove_var("TRAVERSAL_TEST_INVALID_NUMBER");
    }

    #[test]
    fn test_build_env_key() {
        assert_eq!(build_env_key("TRAVERSAL_", "query_log_level"), "TRAVERSAL_QUERY_LOG_LEVEL");
    }
}
