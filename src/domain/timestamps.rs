//! Wire representation of timestamps: milliseconds since the Unix epoch, as a string.

use time::OffsetDateTime;

use super::error::DomainError;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Render `value` as whole milliseconds since the epoch.
pub fn to_millis_string(value: OffsetDateTime) -> String {
    (value.unix_timestamp_nanos() / NANOS_PER_MILLI).to_string()
}

/// Parse a millisecond string produced by [`to_millis_string`].
pub fn parse_millis(value: &str) -> Result<OffsetDateTime, DomainError> {
    let millis: i64 = value
        .trim()
        .parse()
        .map_err(|_| DomainError::invalid_timestamp(value))?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
        .map_err(|_| DomainError::invalid_timestamp(value))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn millis_truncate_sub_millisecond_precision() {
        let value = datetime!(2023-11-14 22:13:20.123456 UTC);
        assert_eq!(to_millis_string(value), "1700000000123");
    }

    #[test]
    fn parse_reads_back_rendered_millis() {
        let parsed = parse_millis("1700000000123").expect("valid millis");
        assert_eq!(parsed, datetime!(2023-11-14 22:13:20.123 UTC));
    }

    #[test]
    fn parse_rejects_non_numeric_input() {
        let err = parse_millis("yesterday").expect_err("invalid");
        assert!(matches!(err, DomainError::InvalidTimestamp { .. }));
    }
}
