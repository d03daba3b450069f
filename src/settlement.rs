//! The algorithm that computes the money exchanges needed to settle the
//! balances of an event.

use log::Level::Debug;
use log::{debug, log_enabled, warn};

use crate::types::{Amount, Balance, MoneyExchange, ParticipantOverview, Person, Settlement};

/// Remaining amounts below this are considered settled. Floating-point
/// division leaves residues far below a cent that must not produce exchanges.
const SETTLED_TOLERANCE: Amount = 1e-6;

/// A person with the (positive) amount they still have to pay or receive.
#[derive(Debug)]
struct Party<'a> {
    person: &'a Person,
    amount: Amount,
}

/// Compute the balance of every participant and the exchanges that settle them.
///
/// The balance of a person is what they contributed minus their share, where
/// the share is the sum of the per-transaction averages they took part in.
/// A positive balance means the person paid too much and must receive money,
/// a negative balance means the person must pay.
pub fn compute_settlement(overviews: &[ParticipantOverview]) -> Settlement {
    let balances = compute_balances(overviews);

    let debtors: Vec<_> = balances
        .iter()
        .filter(|b| b.amount < -SETTLED_TOLERANCE)
        .map(|b| Party {
            person: &b.person,
            amount: -b.amount,
        })
        .collect();
    let creditors: Vec<_> = balances
        .iter()
        .filter(|b| b.amount > SETTLED_TOLERANCE)
        .map(|b| Party {
            person: &b.person,
            amount: b.amount,
        })
        .collect();

    let total_credits: Amount = debtors.iter().map(|p| p.amount).sum();
    let total_debits: Amount = creditors.iter().map(|p| p.amount).sum();

    // Compare what is shown to the user, i.e. amounts rounded to cents.
    let mismatch = format!("{total_credits:.2}") != format!("{total_debits:.2}");
    if mismatch {
        warn!("Credits ({total_credits:.2}) different than debits ({total_debits:.2})");
    }

    let exchanges = compute_exchanges(debtors, creditors);

    Settlement {
        balances,
        exchanges,
        total_credits,
        total_debits,
        mismatch,
    }
}

pub fn compute_balances(overviews: &[ParticipantOverview]) -> Vec<Balance> {
    overviews
        .iter()
        .map(|o| Balance {
            person: o.person.clone(),
            contributed: o.total_contributed,
            share: o.average_in_participations,
            amount: o.total_contributed - o.average_in_participations,
        })
        .collect()
}

/// Get a list of money exchanges which settle the given debts and credits.
///
/// The algorithm works as follows:
/// - sort debtors and creditors by the amount they owe or are owed, largest first
/// - let the largest debtor pay the largest creditor the smaller of the two amounts
/// - subtract the payment from both, drop whoever is settled and sort again
/// - stop when there are no more debtors or creditors
///
/// This keeps the number of exchanges low but it is not guaranteed to be
/// minimal: the optimal solution is NP-complete. The result is deterministic
/// because ties are broken by name.
fn compute_exchanges(mut debtors: Vec<Party>, mut creditors: Vec<Party>) -> Vec<MoneyExchange> {
    sort_parties(&mut debtors);
    sort_parties(&mut creditors);

    if log_enabled!(Debug) {
        debug!("{:?}", &debtors);
        debug!("{:?}", &creditors);
    }

    let mut result = vec![];

    while let (Some(debtor), Some(creditor)) = (debtors.first(), creditors.first()) {
        let amount = debtor.amount.min(creditor.amount);
        result.push(MoneyExchange::new(
            &debtor.person.name,
            &creditor.person.name,
            amount,
        ));

        debtors[0].amount -= amount;
        creditors[0].amount -= amount;

        debtors.retain(|p| p.amount > SETTLED_TOLERANCE);
        creditors.retain(|p| p.amount > SETTLED_TOLERANCE);
        sort_parties(&mut debtors);
        sort_parties(&mut creditors);
    }

    if !creditors.is_empty() {
        warn!(
            "We run out of debtors but we still have creditors: {:?}",
            creditors
        );
    } else if !debtors.is_empty() {
        warn!(
            "We run out of creditors but we still have debtors: {:?}",
            debtors
        );
    }

    result
}

fn sort_parties(parties: &mut [Party]) {
    parties.sort_by(|x, y| {
        y.amount
            .total_cmp(&x.amount)
            .then_with(|| x.person.name.cmp(&y.person.name))
            .then_with(|| x.person.id.cmp(&y.person.id))
    });
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn overview(id: i64, name: &str, contributed: Amount, share: Amount) -> ParticipantOverview {
        ParticipantOverview {
            person: Person::new(id, name),
            participations: vec![],
            participation_count: 1,
            total_contributed: contributed,
            average_contributed: contributed,
            total_in_participations: share,
            average_in_participations: share,
        }
    }

    fn make_overviews() -> Vec<ParticipantOverview> {
        vec![
            overview(1, "a", 150.0, 100.0),
            overview(2, "b", 130.0, 100.0),
            overview(3, "c", 60.0, 100.0),
            overview(4, "d", 75.0, 100.0),
            overview(5, "e", 85.0, 100.0),
        ]
    }

    /// Apply every exchange to the balances: the debtor gets money back in the
    /// group, the creditor gets paid.
    fn apply(settlement: &Settlement) -> HashMap<String, Amount> {
        let mut balances: HashMap<_, _> = settlement
            .balances
            .iter()
            .map(|b| (b.person.name.clone(), b.amount))
            .collect();
        for exchange in &settlement.exchanges {
            *balances.get_mut(&exchange.debtor).expect("test") += exchange.amount;
            *balances.get_mut(&exchange.creditor).expect("test") -= exchange.amount;
        }
        balances
    }

    #[test]
    fn test_compute_balances() {
        let balances = compute_balances(&make_overviews());

        assert_eq!(balances.len(), 5);
        assert_abs_diff_eq!(balances[0].amount, 50.0);
        assert_abs_diff_eq!(balances[2].amount, -40.0);
        assert_abs_diff_eq!(balances[2].contributed, 60.0);
        assert_abs_diff_eq!(balances[2].share, 100.0);
    }

    #[test]
    fn test_compute_settlement() {
        let settlement = compute_settlement(&make_overviews());
        let exchanges = &settlement.exchanges;

        assert_eq!(exchanges.len(), 4);

        assert_eq!(exchanges[0].debtor, "c");
        assert_eq!(exchanges[0].creditor, "a");
        assert_abs_diff_eq!(exchanges[0].amount, 40.0);

        assert_eq!(exchanges[1].debtor, "d");
        assert_eq!(exchanges[1].creditor, "b");
        assert_abs_diff_eq!(exchanges[1].amount, 25.0);

        assert_eq!(exchanges[2].debtor, "e");
        assert_eq!(exchanges[2].creditor, "a");
        assert_abs_diff_eq!(exchanges[2].amount, 10.0);

        assert_eq!(exchanges[3].debtor, "e");
        assert_eq!(exchanges[3].creditor, "b");
        assert_abs_diff_eq!(exchanges[3].amount, 5.0);

        assert!(!settlement.mismatch);
        assert_abs_diff_eq!(settlement.total_credits, 80.0);
        assert_abs_diff_eq!(settlement.total_debits, 80.0);
        let paid: Amount = exchanges.iter().map(|e| e.amount).sum();
        assert_abs_diff_eq!(paid, 80.0);
    }

    #[test]
    fn test_settlement_zeroes_balances() {
        let settlement = compute_settlement(&make_overviews());
        for (_, balance) in apply(&settlement) {
            assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_two_person_settlement() {
        // A paid 20 and B paid 10 of a 30 expense split between the two.
        let overviews = vec![overview(1, "A", 20.0, 15.0), overview(2, "B", 10.0, 15.0)];
        let settlement = compute_settlement(&overviews);

        assert_eq!(settlement.exchanges.len(), 1);
        assert_eq!(settlement.exchanges[0].debtor, "B");
        assert_eq!(settlement.exchanges[0].creditor, "A");
        assert_abs_diff_eq!(settlement.exchanges[0].amount, 5.0);
    }

    #[test]
    fn test_ties_are_broken_by_name() {
        let overviews = vec![
            overview(1, "z", 0.0, 10.0),
            overview(2, "y", 0.0, 10.0),
            overview(3, "x", 20.0, 0.0),
        ];
        let settlement = compute_settlement(&overviews);

        assert_eq!(settlement.exchanges.len(), 2);
        assert_eq!(settlement.exchanges[0].debtor, "y");
        assert_eq!(settlement.exchanges[1].debtor, "z");
    }

    #[test]
    fn test_balanced_event_needs_no_exchanges() {
        let overviews = vec![overview(1, "a", 10.0, 10.0), overview(2, "b", 0.0, 0.0)];
        let settlement = compute_settlement(&overviews);
        assert!(settlement.exchanges.is_empty());
    }

    #[test]
    fn test_rounding_residue_is_ignored() {
        // Three people share 10: each share is 3.333...
        let share = 10.0 / 3.0;
        let overviews = vec![
            overview(1, "a", 10.0, share),
            overview(2, "b", 0.0, share),
            overview(3, "c", 0.0, share),
        ];
        let settlement = compute_settlement(&overviews);

        assert_eq!(settlement.exchanges.len(), 2);
        assert!(!settlement.mismatch);
        for (_, balance) in apply(&settlement) {
            assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_mismatch_is_flagged() {
        let overviews = vec![overview(1, "a", 10.0, 0.0), overview(2, "b", 0.0, 5.0)];
        let settlement = compute_settlement(&overviews);

        assert!(settlement.mismatch);
        assert_eq!(settlement.exchanges.len(), 1);
        assert_abs_diff_eq!(settlement.exchanges[0].amount, 5.0);
    }
}
