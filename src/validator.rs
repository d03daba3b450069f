//! Functions that check the validity of user input.
//!
//! These checks only look at the values they are given; the database layer
//! runs them before opening a unit of work and then re-checks existence and
//! uniqueness against the stored data.

use std::collections::HashSet;

use crate::error::{LedgerError, LedgerResult};

pub const MIN_NAME_LENGTH: usize = 1;
pub const MAX_NAME_LENGTH: usize = 20;
pub const MIN_DESCRIPTION_LENGTH: usize = 1;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Lowest accepted exchange rate (inclusive).
pub const MIN_EXCHANGE_RATE: f64 = 1e-9;
/// Highest accepted exchange rate (exclusive).
pub const MAX_EXCHANGE_RATE: f64 = 1e11;

pub const MIN_CONTRIBUTION: f64 = -1e9;
pub const MAX_CONTRIBUTION: f64 = 1e9;

/// Trim the string and check that its length is between *min_length* and *max_length*.
///
/// Returns the trimmed string.
pub fn validate_string_length(
    source: &str,
    min_length: usize,
    max_length: usize,
    param: &str,
) -> LedgerResult<String> {
    let result = source.trim();
    if result.is_empty() {
        return Err(LedgerError::validation(format!(
            "{param} must not be empty or whitespace"
        )));
    }

    let length = result.chars().count();
    if length < min_length {
        Err(LedgerError::validation(format!(
            "{param} has to be at least {min_length} characters long"
        )))
    } else if length > max_length {
        Err(LedgerError::validation(format!(
            "{param} has to be at most {max_length} characters long"
        )))
    } else {
        Ok(result.to_string())
    }
}

pub fn validate_name(name: &str) -> LedgerResult<String> {
    validate_string_length(name, MIN_NAME_LENGTH, MAX_NAME_LENGTH, "name")
}

pub fn validate_description(description: &str) -> LedgerResult<String> {
    validate_string_length(
        description,
        MIN_DESCRIPTION_LENGTH,
        MAX_DESCRIPTION_LENGTH,
        "description",
    )
}

pub fn validate_exchange_rate(exchange_rate: f64) -> LedgerResult<()> {
    if !is_exchange_rate_in_range(exchange_rate) {
        Err(LedgerError::validation(format!(
            "exchangeRate has to be at least {MIN_EXCHANGE_RATE} and less than {MAX_EXCHANGE_RATE}"
        )))
    } else {
        Ok(())
    }
}

pub fn is_exchange_rate_in_range(exchange_rate: f64) -> bool {
    (MIN_EXCHANGE_RATE..MAX_EXCHANGE_RATE).contains(&exchange_rate)
}

pub fn validate_contribution_amount(amount: f64) -> LedgerResult<()> {
    if !(MIN_CONTRIBUTION..=MAX_CONTRIBUTION).contains(&amount) {
        Err(LedgerError::validation(format!(
            "amount has to be between {MIN_CONTRIBUTION} and {MAX_CONTRIBUTION}"
        )))
    } else {
        Ok(())
    }
}

/// Check the extra and excluded persons of a transaction against the persons
/// known to the database and the participants of the event.
///
/// List of checks:
/// - all extra persons exist
/// - all excluded persons exist
/// - all excluded persons are participants of the event
/// - no extra person is a participant of the event
pub fn validate_transaction_participants(
    extra_persons: &HashSet<i64>,
    excluded_persons: &HashSet<i64>,
    all_person_ids: &HashSet<i64>,
    event_person_ids: &HashSet<i64>,
) -> LedgerResult<()> {
    if !extra_persons.is_subset(all_person_ids) {
        return Err(LedgerError::persons_not_found("extra persons"));
    }
    if !excluded_persons.is_subset(all_person_ids) {
        return Err(LedgerError::persons_not_found("excluded persons"));
    }
    if !excluded_persons.is_subset(event_person_ids) {
        return Err(LedgerError::excluded_not_member());
    }
    if !extra_persons.is_disjoint(event_person_ids) {
        return Err(LedgerError::extra_already_member());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> HashSet<i64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_validate_string_length_trims() {
        assert_eq!(validate_name("  Trip  ").expect("test"), "Trip");
        assert_eq!(
            validate_name("abcdefghijklmnopqrst").expect("test"),
            "abcdefghijklmnopqrst"
        );
    }

    #[test]
    fn test_validate_string_length_rejects() {
        assert!(matches!(validate_name(""), Err(LedgerError::Validation(_))));
        assert!(matches!(
            validate_name("   "),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            validate_name("abcdefghijklmnopqrstu"),
            Err(LedgerError::Validation(_))
        ));
        assert!(validate_description(&"x".repeat(255)).is_ok());
        assert!(validate_description(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        // 20 characters, but more than 20 bytes.
        assert!(validate_name("àààààààààààààààààààà").is_ok());
    }

    #[test]
    fn test_exchange_rate_bounds() {
        assert!(validate_exchange_rate(1e-9).is_ok());
        assert!(validate_exchange_rate(99_999_999_999.0).is_ok());
        assert!(validate_exchange_rate(1e11).is_err());
        assert!(validate_exchange_rate(1e-10).is_err());
        assert!(validate_exchange_rate(0.0).is_err());
        assert!(validate_exchange_rate(-2.0).is_err());
        assert!(validate_exchange_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_contribution_bounds() {
        assert!(validate_contribution_amount(-1e9).is_ok());
        assert!(validate_contribution_amount(1e9).is_ok());
        assert!(validate_contribution_amount(0.0).is_ok());
        assert!(validate_contribution_amount(1e9 + 1.0).is_err());
        assert!(validate_contribution_amount(-1e9 - 1.0).is_err());
    }

    #[test]
    fn test_transaction_participants() {
        let all = set(&[1, 2, 3, 4]);
        let event = set(&[1, 2]);

        assert!(validate_transaction_participants(&set(&[3]), &set(&[1]), &all, &event).is_ok());
        assert!(matches!(
            validate_transaction_participants(&set(&[5]), &set(&[]), &all, &event),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            validate_transaction_participants(&set(&[]), &set(&[9]), &all, &event),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            validate_transaction_participants(&set(&[]), &set(&[3]), &all, &event),
            Err(LedgerError::NotDefined(_))
        ));
        assert!(matches!(
            validate_transaction_participants(&set(&[2]), &set(&[]), &all, &event),
            Err(LedgerError::AlreadyDefined(_))
        ));
    }
}
