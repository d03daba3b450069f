//! Exchange rate arithmetic for the currencies of one event.

use log::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::types::Currency;
use crate::validator::is_exchange_rate_in_range;

/// Make the currency with id *target_id* the base currency of *currencies*.
///
/// Every other rate is divided by the current rate of the target, so the
/// proportions between currencies are preserved. The new rates are all checked
/// before anything is returned: on error the caller has nothing to write back.
///
/// If the target is already the base currency the list is returned unchanged.
pub fn rebase(currencies: &[Currency], target_id: i64) -> LedgerResult<Vec<Currency>> {
    let target = currencies
        .iter()
        .find(|c| c.id == target_id)
        .ok_or_else(|| LedgerError::currency_not_found(target_id))?;

    if target.is_base {
        return Ok(currencies.to_vec());
    }

    let base_factor = target.exchange_rate;
    debug!(
        "Rebasing {} currencies on `{}` (factor {base_factor})",
        currencies.len(),
        target.name
    );

    currencies
        .iter()
        .map(|c| {
            if c.id == target_id {
                Ok(Currency::new(c.id, &c.name, 1.0, true))
            } else {
                let exchange_rate = c.exchange_rate / base_factor;
                if !is_exchange_rate_in_range(exchange_rate) {
                    return Err(LedgerError::exchange_rate_out_of_range(
                        &c.name,
                        exchange_rate,
                    ));
                }
                Ok(Currency::new(c.id, &c.name, exchange_rate, false))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn make_currencies() -> Vec<Currency> {
        vec![
            Currency::new(1, "EUR", 1.0, true),
            Currency::new(2, "GBP", 1.25, false),
            Currency::new(3, "JPY", 0.008, false),
        ]
    }

    #[test]
    fn test_rebase() {
        let rebased = rebase(&make_currencies(), 2).expect("test");

        assert_eq!(rebased.len(), 3);
        assert_eq!(rebased.iter().filter(|c| c.is_base).count(), 1);
        assert!(rebased[1].is_base);
        assert_abs_diff_eq!(rebased[1].exchange_rate, 1.0);
        assert_abs_diff_eq!(rebased[0].exchange_rate, 0.8);
        assert_abs_diff_eq!(rebased[2].exchange_rate, 0.0064, epsilon = 1e-12);
    }

    #[test]
    fn test_rebase_and_back() {
        let original = make_currencies();
        let rebased = rebase(&original, 3).expect("test");
        let restored = rebase(&rebased, 1).expect("test");

        for (before, after) in original.iter().zip(restored.iter()) {
            assert_eq!(before.is_base, after.is_base);
            assert_abs_diff_eq!(before.exchange_rate, after.exchange_rate, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rebase_on_base_is_noop() {
        let original = make_currencies();
        let rebased = rebase(&original, 1).expect("test");
        assert_eq!(original, rebased);
    }

    #[test]
    fn test_rebase_out_of_range() {
        let currencies = vec![
            Currency::new(1, "EUR", 1.0, true),
            Currency::new(2, "BIG", 1e10, false),
            Currency::new(3, "TINY", 1e-8, false),
        ];

        // TINY as base would make BIG worth 1e18.
        assert!(matches!(
            rebase(&currencies, 3),
            Err(LedgerError::OutOfRange(_))
        ));
        // BIG as base would make TINY worth 1e-18.
        assert!(matches!(
            rebase(&currencies, 2),
            Err(LedgerError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_rebase_unknown_currency() {
        assert!(matches!(
            rebase(&make_currencies(), 42),
            Err(LedgerError::NotFound(_))
        ));
    }
}
