//! Remote adapters for individual Linode resource kinds

pub mod domain;
pub mod image;
pub mod instance_config;
pub mod networking_ip;
pub mod rdns;
pub mod user;
pub mod vpc;
pub mod vpc_subnet;

use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use cloudform_core::{CloudError, Field, Result};

/// Value of an attribute the API always returns, such as an id
pub(crate) fn known<T: Clone>(field: &Field<T>, name: &str) -> Result<T> {
    field
        .cloned_option()
        .ok_or_else(|| CloudError::InvalidState(format!("{} is not known yet", name)))
}

/// Linode timestamps (`2024-01-02T03:04:05`, UTC) as RFC 3339.
///
/// Absent timestamps stay unset so they never show up as drift.
pub(crate) fn rfc3339(raw: Option<&str>) -> Field<String> {
    let Some(raw) = raw else {
        return Field::Unset;
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Field::Value(parsed.to_utc().to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        Ok(naive) => Field::Value(naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true)),
        Err(_) => Field::Value(raw.to_string()),
    }
}

/// `Some("")` → `None`; the API returns empty strings for cleared values
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            rfc3339(Some("2024-01-02T03:04:05")),
            Field::Value("2024-01-02T03:04:05Z".to_string())
        );
        assert_eq!(
            rfc3339(Some("2024-01-02T03:04:05+00:00")),
            Field::Value("2024-01-02T03:04:05Z".to_string())
        );
        assert_eq!(rfc3339(None), Field::Unset);
    }
}
