//! Argument validation and normalization, ahead of any network call.

use crate::error::{Error, Result};
use crate::types::TimeRange;

const LIMIT_MIN: i64 = 1;
const LIMIT_MAX: i64 = 100;

/// Clamp a requested item limit into the accepted range rather than
/// rejecting it: 1000 becomes 100, zero and negatives become 1.
pub(crate) fn clamp_limit(limit: i64) -> u32 {
    limit.clamp(LIMIT_MIN, LIMIT_MAX) as u32
}

/// A VIN must be non-empty ASCII alphanumeric; anything else is rejected
/// before a request is built.
pub(crate) fn validate_vin(vin: &str) -> Result<&str> {
    if vin.is_empty() {
        return Err(Error::validation("VIN must not be empty"));
    }
    if !vin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::validation(format!(
            "VIN must be ASCII alphanumeric, got {vin:?}"
        )));
    }
    Ok(vin)
}

pub(crate) fn validate_range(range: &TimeRange) -> Result<()> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(Error::validation(format!(
                "time range start {from} is after end {to}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn limit_clamps_at_both_ends() {
        assert_eq!(clamp_limit(1000), 100);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-5), 1);
    }

    #[test]
    fn vin_rejects_empty_and_non_alphanumeric() {
        assert!(validate_vin("5YJ3E1EA7KF000316").is_ok());
        assert_eq!(validate_vin("").unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            validate_vin("VIN 123").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            validate_vin("../admin").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(validate_range(&TimeRange::new(Some(100), Some(200))).is_ok());
        assert!(validate_range(&TimeRange::new(Some(100), None)).is_ok());
        assert!(validate_range(&TimeRange::default()).is_ok());
        assert_eq!(
            validate_range(&TimeRange::new(Some(200), Some(100)))
                .unwrap_err()
                .kind(),
            ErrorKind::Validation
        );
    }
}
