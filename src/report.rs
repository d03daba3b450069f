//! Aggregation of contributions per participant and per transaction.
//!
//! All amounts are converted to the base currency of the event by multiplying
//! them with the exchange rate of their currency.

use std::collections::BTreeMap;

use crate::settlement::compute_settlement;
use crate::types::{
    Amount, EventSnapshot, ParticipantOverview, Participation, ParticipationOverview, Person,
    Totals, Transaction, TransactionOverview, TransactionParticipant, TransactionRecord,
};

/// Build the projection of a transaction: effective participants, contributors and volumes.
pub fn summarize_transaction(
    event_participants: &[Person],
    record: &TransactionRecord,
) -> Transaction {
    let participants = record.effective_participants(event_participants);
    let total_volume = record.total_volume();
    let average_volume = total_volume / participants.len().max(1) as f64;

    Transaction {
        id: record.id,
        occurred_at: record.occurred_at,
        description: record.description.clone(),
        participants,
        extra_participants: record.extra_participants.clone(),
        excluded_participants: record.excluded_participants.clone(),
        contributors: record
            .contributions
            .iter()
            .map(|c| c.person.clone())
            .collect(),
        total_volume,
        average_volume,
    }
}

pub fn participation(person: &Person, record: &TransactionRecord) -> Participation {
    let contribution = record.contribution_of(person.id);
    Participation {
        person: person.clone(),
        contribution_id: contribution.map(|c| c.id),
        currency: contribution.map(|c| c.currency.clone()),
        amount: contribution.map(|c| c.amount),
        base_amount: contribution.map(|c| c.base_amount()),
    }
}

/// One participation per effective participant of the transaction.
pub fn participations(
    event_participants: &[Person],
    record: &TransactionRecord,
) -> Vec<Participation> {
    record
        .effective_participants(event_participants)
        .iter()
        .map(|p| participation(p, record))
        .collect()
}

/// Event members first, then every person that is an extra participant in at
/// least one transaction of the event.
fn all_participants(snapshot: &EventSnapshot) -> Vec<Person> {
    let members = &snapshot.event.participants;
    let extras: BTreeMap<i64, &Person> = snapshot
        .transactions
        .iter()
        .flat_map(|t| t.extra_participants.iter())
        .filter(|p| !members.iter().any(|m| m.id == p.id))
        .map(|p| (p.id, p))
        .collect();

    members
        .iter()
        .cloned()
        .chain(extras.into_values().cloned())
        .collect()
}

pub fn participant_overviews(snapshot: &EventSnapshot) -> Vec<ParticipantOverview> {
    all_participants(snapshot)
        .into_iter()
        .map(|p| participant_overview(p, snapshot))
        .collect()
}

fn participant_overview(person: Person, snapshot: &EventSnapshot) -> ParticipantOverview {
    let participations = person_participations(&person, snapshot);
    let participation_count = participations.len();

    let total_contributed: Amount = participations.iter().map(|p| p.contributed).sum();
    let average_contributed = if participation_count > 0 {
        total_contributed / participation_count as f64
    } else {
        0.0
    };
    let total_in_participations: Amount = participations.iter().map(|p| p.total_amount).sum();
    let average_in_participations: Amount = participations.iter().map(|p| p.average_amount).sum();

    ParticipantOverview {
        person,
        participations,
        participation_count,
        total_contributed,
        average_contributed,
        total_in_participations,
        average_in_participations,
    }
}

fn person_participations(
    person: &Person,
    snapshot: &EventSnapshot,
) -> Vec<ParticipationOverview> {
    let is_member = snapshot
        .event
        .participants
        .iter()
        .any(|p| p.id == person.id);

    snapshot
        .transactions
        .iter()
        .filter(|t| {
            if is_member {
                !t.is_excluded(person.id)
            } else {
                t.is_extra(person.id)
            }
        })
        .map(|t| {
            let n_participants = t.effective_participants(&snapshot.event.participants).len();
            participation_overview(t, person.id, n_participants)
        })
        .collect()
}

fn participation_overview(
    record: &TransactionRecord,
    person_id: i64,
    n_participants: usize,
) -> ParticipationOverview {
    let total_amount = record.total_volume();
    ParticipationOverview {
        transaction_id: record.id,
        transaction_description: record.description.clone(),
        contributed: record
            .contribution_of(person_id)
            .map(|c| c.base_amount())
            .unwrap_or(0.0),
        total_amount,
        average_amount: if n_participants > 0 {
            total_amount / n_participants as f64
        } else {
            0.0
        },
    }
}

pub fn transaction_overviews(snapshot: &EventSnapshot) -> Vec<TransactionOverview> {
    snapshot
        .transactions
        .iter()
        .map(|t| transaction_overview(&snapshot.event.participants, t))
        .collect()
}

fn transaction_overview(
    event_participants: &[Person],
    record: &TransactionRecord,
) -> TransactionOverview {
    let participants: Vec<_> = record
        .effective_participants(event_participants)
        .into_iter()
        .map(|p| TransactionParticipant {
            amount: record
                .contribution_of(p.id)
                .map(|c| c.base_amount())
                .unwrap_or(0.0),
            person_id: p.id,
            person_name: p.name,
        })
        .collect();

    let total_amount: Amount = participants.iter().map(|p| p.amount).sum();
    let average_amount = if participants.is_empty() {
        0.0
    } else {
        total_amount / participants.len() as f64
    };

    TransactionOverview {
        transaction_id: record.id,
        transaction_description: record.description.clone(),
        participants,
        total_amount,
        average_amount,
    }
}

/// Everything needed to show the totals of an event, settlement included.
pub fn totals(snapshot: &EventSnapshot) -> Totals {
    let total_amount = transaction_overviews(snapshot)
        .iter()
        .map(|t| t.total_amount)
        .sum();
    let participants = participant_overviews(snapshot);
    let settlement = compute_settlement(&participants);

    Totals {
        event_name: snapshot.event.name.clone(),
        total_amount,
        participants,
        settlement,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, Utc};

    use crate::types::{ContributionRecord, Currency, Event};

    use super::*;

    pub(crate) fn record(
        id: i64,
        extra: Vec<Person>,
        excluded: Vec<Person>,
        contributions: Vec<ContributionRecord>,
    ) -> TransactionRecord {
        TransactionRecord {
            id,
            description: format!("transaction {id}"),
            occurred_at: DateTime::<Utc>::MIN_UTC,
            extra_participants: extra,
            excluded_participants: excluded,
            contributions,
        }
    }

    pub(crate) fn contribution(
        id: i64,
        person: &Person,
        amount: Amount,
        currency: &Currency,
    ) -> ContributionRecord {
        ContributionRecord {
            id,
            person: person.clone(),
            amount,
            currency: currency.clone(),
        }
    }

    /// Two members and one extra participant; the first transaction is shared by
    /// the members, the second excludes p1 and includes p3.
    pub(crate) fn make_snapshot() -> EventSnapshot {
        let p1 = Person::new(1, "p1");
        let p2 = Person::new(2, "p2");
        let p3 = Person::new(3, "p3");
        let c1 = Currency::new(1, "EUR", 1.0, true);
        let c2 = Currency::new(2, "GBP", 2.0, false);

        EventSnapshot {
            event: Event {
                id: 1,
                name: "Trip".to_string(),
                participants: vec![p1.clone(), p2.clone()],
            },
            transactions: vec![
                record(1, vec![], vec![], vec![contribution(1, &p1, 200.0, &c1)]),
                record(
                    2,
                    vec![p3.clone()],
                    vec![p1],
                    vec![
                        contribution(2, &p2, 100.0, &c1),
                        contribution(3, &p3, 50.0, &c2),
                    ],
                ),
            ],
        }
    }

    fn check_overview(
        overview: &ParticipantOverview,
        participation_count: usize,
        total_contributed: Amount,
        average_contributed: Amount,
        total_in_participations: Amount,
        average_in_participations: Amount,
    ) {
        assert_eq!(overview.participation_count, participation_count);
        assert_abs_diff_eq!(overview.total_contributed, total_contributed);
        assert_abs_diff_eq!(overview.average_contributed, average_contributed);
        assert_abs_diff_eq!(overview.total_in_participations, total_in_participations);
        assert_abs_diff_eq!(overview.average_in_participations, average_in_participations);
    }

    #[test]
    fn test_participant_overviews() {
        let overviews = participant_overviews(&make_snapshot());

        assert_eq!(overviews.len(), 3);
        assert_eq!(overviews[0].person.name, "p1");
        assert_eq!(overviews[1].person.name, "p2");
        assert_eq!(overviews[2].person.name, "p3");

        check_overview(&overviews[0], 1, 200.0, 200.0, 200.0, 100.0);
        check_overview(&overviews[1], 2, 100.0, 50.0, 400.0, 200.0);
        check_overview(&overviews[2], 1, 100.0, 100.0, 200.0, 100.0);
    }

    #[test]
    fn test_transaction_overviews() {
        let overviews = transaction_overviews(&make_snapshot());

        assert_eq!(overviews.len(), 2);
        for overview in &overviews {
            assert_eq!(overview.participants.len(), 2);
            assert_abs_diff_eq!(overview.total_amount, 200.0);
            assert_abs_diff_eq!(overview.average_amount, 100.0);
        }
        let names: Vec<_> = overviews[1]
            .participants
            .iter()
            .map(|p| p.person_name.as_str())
            .collect();
        assert_eq!(names, vec!["p2", "p3"]);
    }

    #[test]
    fn test_summarize_transaction() {
        let snapshot = make_snapshot();
        let transaction =
            summarize_transaction(&snapshot.event.participants, &snapshot.transactions[1]);

        assert_eq!(transaction.participants.len(), 2);
        assert_eq!(transaction.contributors.len(), 2);
        assert_abs_diff_eq!(transaction.total_volume, 200.0);
        assert_abs_diff_eq!(transaction.average_volume, 100.0);
    }

    #[test]
    fn test_summarize_transaction_without_participants() {
        let p1 = Person::new(1, "p1");
        let c1 = Currency::new(1, "EUR", 1.0, true);

        let all_excluded = record(1, vec![], vec![p1.clone()], vec![]);
        let transaction = summarize_transaction(&[p1.clone()], &all_excluded);
        assert!(transaction.participants.is_empty());
        assert_abs_diff_eq!(transaction.average_volume, 0.0);

        // Average over max(1, N) participants.
        let orphan = record(2, vec![], vec![], vec![contribution(1, &p1, 30.0, &c1)]);
        let transaction = summarize_transaction(&[], &orphan);
        assert_abs_diff_eq!(transaction.average_volume, 30.0);
    }

    #[test]
    fn test_participations() {
        let snapshot = make_snapshot();
        let result = participations(&snapshot.event.participants, &snapshot.transactions[1]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].person.name, "p2");
        assert_eq!(result[0].amount, Some(100.0));
        assert_eq!(result[1].person.name, "p3");
        assert_eq!(result[1].amount, Some(50.0));
        assert_eq!(result[1].base_amount, Some(100.0));
        assert_eq!(result[1].currency.as_ref().map(|c| c.name.as_str()), Some("GBP"));

        let result = participations(&snapshot.event.participants, &snapshot.transactions[0]);
        assert_eq!(result.len(), 2);
        assert!(result[1].contribution_id.is_none());
        assert!(result[1].amount.is_none());
    }

    #[test]
    fn test_totals() {
        let totals = totals(&make_snapshot());

        assert_eq!(totals.event_name, "Trip");
        assert_abs_diff_eq!(totals.total_amount, 400.0);
        assert_eq!(totals.participants.len(), 3);
        // p1: 200 - 100, p2: 100 - 200, p3: 100 - 100.
        assert_eq!(totals.settlement.exchanges.len(), 1);
        assert_eq!(totals.settlement.exchanges[0].debtor, "p2");
        assert_eq!(totals.settlement.exchanges[0].creditor, "p1");
        assert_abs_diff_eq!(totals.settlement.exchanges[0].amount, 100.0);
    }
}
