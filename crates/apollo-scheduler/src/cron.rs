//! Cron spec normalization and parsing.

use std::str::FromStr;

use crate::error::{Result, SchedulerError};

/// Parse a five- or six-field cron spec into a [`cron::Schedule`].
///
/// Five-field specs get `0` prepended as the seconds column. Anything that
/// is not 5 or 6 whitespace-separated fields, or that the cron grammar
/// rejects, is an error.
pub fn parse_spec(spec: &str) -> Result<cron::Schedule> {
    let normalized = normalize_spec(spec)?;
    cron::Schedule::from_str(&normalized).map_err(|e| SchedulerError::InvalidSpec {
        spec: spec.to_string(),
        reason: e.to_string(),
    })
}

/// Promote a five-field spec to the six-field (seconds-first) form.
pub fn normalize_spec(spec: &str) -> Result<String> {
    let fields = spec.split_whitespace().count();
    match fields {
        5 => Ok(format!("0 {}", spec.trim())),
        6 => Ok(spec.trim().to_string()),
        _ => Err(SchedulerError::InvalidSpec {
            spec: spec.to_string(),
            reason: format!("expected 5 or 6 fields, got {fields}"),
        }),
    }
}

/// Strip the leading seconds field from a six-field spec; five-field specs
/// pass through unchanged. Cloud-side schedulers only accept the classic
/// five-field form.
pub fn to_five_field(spec: &str) -> String {
    let fields: Vec<&str> = spec.split_whitespace().collect();
    if fields.len() == 6 {
        fields[1..].join(" ")
    } else {
        spec.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_field_spec_parses() {
        assert!(parse_spec("0 0 2 * * *").is_ok());
    }

    #[test]
    fn five_field_spec_gets_zero_seconds() {
        assert_eq!(normalize_spec("0 2 * * *").unwrap(), "0 0 2 * * *");
    }

    #[test]
    fn six_field_spec_is_unchanged_by_normalize() {
        assert_eq!(normalize_spec("*/5 * * * * *").unwrap(), "*/5 * * * * *");
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert!(parse_spec("* * *").is_err());
        assert!(parse_spec("").is_err());
    }

    #[test]
    fn garbage_fields_are_rejected() {
        assert!(parse_spec("not a cron spec at all!").is_err());
    }

    #[test]
    fn to_five_field_drops_leading_seconds() {
        assert_eq!(to_five_field("0 0 2 * * *"), "0 2 * * *");
        assert_eq!(to_five_field("*/30 1 2 3 4 5"), "1 2 3 4 5");
    }

    #[test]
    fn to_five_field_keeps_five_field_specs() {
        assert_eq!(to_five_field("0 2 * * *"), "0 2 * * *");
    }
}
