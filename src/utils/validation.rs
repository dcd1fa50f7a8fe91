use crate::utils::error::{EventHubError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

pub const EVENT_NAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_.:\-]{0,127}$";

static EVENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EVENT_NAME_PATTERN).expect("event name pattern compiles"));

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Parses an endpoint URL. Only absolute `http`/`https` URLs with a host are accepted.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<Url> {
    let invalid = |reason: String| EventHubError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    let url = Url::parse(url_str).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("Unsupported URL scheme: {}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL must name a host".to_string()));
    }
    Ok(url)
}

/// Requires `path` to point at an existing regular file.
pub fn validate_config_file(field_name: &str, path: &str) -> Result<()> {
    if Path::new(path).is_file() {
        return Ok(());
    }
    Err(EventHubError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: path.to_string(),
        reason: "Configuration file does not exist".to_string(),
    })
}

/// Returns the value of a required field, treating blank strings as absent.
pub fn validate_required_field<'a>(field_name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EventHubError::MissingConfigError {
            field: field_name.to_string(),
        }),
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EventHubError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_event_name(name: &str) -> Result<()> {
    if EVENT_NAME_RE.is_match(name) {
        return Ok(());
    }

    let reason = if name.is_empty() {
        "Event name cannot be empty".to_string()
    } else if name.len() > 128 {
        "Event name cannot be longer than 128 characters".to_string()
    } else {
        format!("Event name must match {}", EVENT_NAME_PATTERN)
    };

    Err(EventHubError::InvalidEventName {
        name: name.to_string(),
        reason,
    })
}
