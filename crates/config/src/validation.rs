//! Section contract and field checks

use crate::error::{ConfigError, ConfigResult, ValidationError};
use std::str::FromStr;

/// A `[section]` of the config file
///
/// Sections check their own fields and accept textual assignments, which is
/// how both `dreamfm config set` and `DREAMFM_*` variables reach them.
pub trait ConfigSection: Default {
    /// Table name in the TOML file
    const NAME: &'static str;

    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Assigns `key` (a field name without the section) from its text form
    fn set(&mut self, key: &str, value: &str) -> ConfigResult<()>;
}

pub(crate) fn in_range<T>(field: &str, value: T, min: T, max: T) -> Option<ValidationError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    (value < min || value > max).then(|| ValidationError::out_of_range(field, min, max, value))
}

pub(crate) fn not_blank(field: &str, value: &str) -> Option<ValidationError> {
    value
        .trim()
        .is_empty()
        .then(|| ValidationError::new(field, "must not be empty"))
}

/// Absolute http(s) URL with something after the scheme
pub(crate) fn http_url(field: &str, value: &str) -> Option<ValidationError> {
    let host = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));

    match host {
        Some(host) if !host.is_empty() && !host.starts_with('/') => None,
        _ => Some(ValidationError::new(
            field,
            format!("must be an http:// or https:// URL (got '{}')", value),
        )),
    }
}

/// Turns the failed checks of a section into its validation result
pub(crate) fn report(
    problems: impl IntoIterator<Item = Option<ValidationError>>,
) -> Result<(), Vec<ValidationError>> {
    let problems: Vec<_> = problems.into_iter().flatten().collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Parses the text form of a setting
pub(crate) fn parse<T: FromStr>(section: &str, key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::BadValue {
        key: format!("{}.{}", section, key),
        value: value.to_string(),
    })
}

pub(crate) fn unknown(section: &str, key: &str) -> ConfigError {
    ConfigError::UnknownKey(format!("{}.{}", section, key))
}
