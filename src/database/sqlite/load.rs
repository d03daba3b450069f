//! Queries shared by the operations: loading rows and turning them into types.
//!
//! Functions named `require_*` return a `LedgerError::NotFound` (wrapped in
//! `anyhow`) when the row does not exist.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    error::LedgerError,
    types::{ContributionRecord, Currency, Event, EventSnapshot, Person, TransactionRecord},
};

const SELECT_EXTRA_PARTICIPANTS: &str = "SELECT p.id, p.name FROM extra_participant x
     INNER JOIN person p ON x.person_id = p.id
     WHERE x.transaction_id = ?1
     ORDER BY p.id";

const SELECT_EXCLUDED_PARTICIPANTS: &str = "SELECT p.id, p.name FROM excluded_participant x
     INNER JOIN person p ON x.person_id = p.id
     WHERE x.transaction_id = ?1
     ORDER BY p.id";

fn person_from_row(row: &Row, offset: usize) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
    })
}

fn currency_from_row(row: &Row, offset: usize) -> rusqlite::Result<Currency> {
    Ok(Currency {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        exchange_rate: row.get(offset + 2)?,
        is_base: row.get(offset + 3)?,
    })
}

pub fn require_person(connection: &Connection, person_id: i64) -> anyhow::Result<Person> {
    let person = connection
        .query_row(
            "SELECT id, name FROM person WHERE id = ?1",
            params![&person_id],
            |row| person_from_row(row, 0),
        )
        .optional()?;

    person.ok_or_else(|| LedgerError::person_not_found(person_id).into())
}

pub fn all_person_ids(connection: &Connection) -> anyhow::Result<HashSet<i64>> {
    let mut stmt = connection.prepare_cached("SELECT id FROM person")?;
    let ids = stmt
        .query_map((), |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    Ok(ids)
}

/// Check that every id refers to an existing person.
pub fn require_persons(connection: &Connection, person_ids: &HashSet<i64>) -> anyhow::Result<()> {
    if person_ids.is_subset(&all_person_ids(connection)?) {
        Ok(())
    } else {
        Err(LedgerError::persons_not_found("specified persons").into())
    }
}

pub fn event_participants(connection: &Connection, event_id: i64) -> anyhow::Result<Vec<Person>> {
    let mut stmt = connection.prepare_cached(
        "SELECT p.id, p.name FROM event_person ep
         INNER JOIN person p ON ep.person_id = p.id
         WHERE ep.event_id = ?1
         ORDER BY p.id",
    )?;

    let participants = stmt
        .query_map(params![&event_id], |row| person_from_row(row, 0))?
        .collect::<Result<_, _>>()?;
    Ok(participants)
}

pub fn require_event(connection: &Connection, event_id: i64) -> anyhow::Result<Event> {
    let name: Option<String> = connection
        .query_row(
            "SELECT name FROM event WHERE id = ?1",
            params![&event_id],
            |row| row.get(0),
        )
        .optional()?;
    let name = name.ok_or_else(|| LedgerError::event_not_found(event_id))?;

    Ok(Event {
        id: event_id,
        name,
        participants: event_participants(connection, event_id)?,
    })
}

pub fn currencies(connection: &Connection, event_id: i64) -> anyhow::Result<Vec<Currency>> {
    let mut stmt = connection.prepare_cached(
        "SELECT id, name, exchange_rate, is_base FROM currency
         WHERE event_id = ?1
         ORDER BY id",
    )?;

    let currencies = stmt
        .query_map(params![&event_id], |row| currency_from_row(row, 0))?
        .collect::<Result<_, _>>()?;
    Ok(currencies)
}

/// Load a currency together with the id of the event it belongs to.
pub fn require_currency(
    connection: &Connection,
    currency_id: i64,
) -> anyhow::Result<(Currency, i64)> {
    let currency: Option<(Currency, i64)> = connection
        .query_row(
            "SELECT id, name, exchange_rate, is_base, event_id FROM currency WHERE id = ?1",
            params![&currency_id],
            |row| Ok((currency_from_row(row, 0)?, row.get(4)?)),
        )
        .optional()?;

    currency.ok_or_else(|| LedgerError::currency_not_found(currency_id).into())
}

fn linked_persons(
    connection: &Connection,
    query: &str,
    transaction_id: i64,
) -> anyhow::Result<Vec<Person>> {
    let mut stmt = connection.prepare_cached(query)?;
    let persons = stmt
        .query_map(params![&transaction_id], |row| person_from_row(row, 0))?
        .collect::<Result<_, _>>()?;
    Ok(persons)
}

fn contributions(
    connection: &Connection,
    transaction_id: i64,
) -> anyhow::Result<Vec<ContributionRecord>> {
    let mut stmt = connection.prepare_cached(
        "SELECT c.id, c.amount, p.id, p.name, cu.id, cu.name, cu.exchange_rate, cu.is_base
         FROM contribution c
         INNER JOIN person p ON c.person_id = p.id
         INNER JOIN currency cu ON c.currency_id = cu.id
         WHERE c.transaction_id = ?1
         ORDER BY p.id",
    )?;

    let contributions = stmt
        .query_map(params![&transaction_id], |row| {
            Ok(ContributionRecord {
                id: row.get(0)?,
                amount: row.get(1)?,
                person: person_from_row(row, 2)?,
                currency: currency_from_row(row, 4)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(contributions)
}

/// Load a transaction with its participants and contributions, together with
/// the id of the event it belongs to.
pub fn require_transaction(
    connection: &Connection,
    transaction_id: i64,
) -> anyhow::Result<(TransactionRecord, i64)> {
    let row: Option<(String, DateTime<Utc>, i64)> = connection
        .query_row(
            "SELECT description, occurred_at, event_id FROM event_transaction WHERE id = ?1",
            params![&transaction_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let (description, occurred_at, event_id) =
        row.ok_or_else(|| LedgerError::transaction_not_found(transaction_id))?;

    let record = TransactionRecord {
        id: transaction_id,
        description,
        occurred_at,
        extra_participants: linked_persons(connection, SELECT_EXTRA_PARTICIPANTS, transaction_id)?,
        excluded_participants: linked_persons(
            connection,
            SELECT_EXCLUDED_PARTICIPANTS,
            transaction_id,
        )?,
        contributions: contributions(connection, transaction_id)?,
    };

    Ok((record, event_id))
}

/// Load all transactions of an event, oldest first.
pub fn transactions(
    connection: &Connection,
    event_id: i64,
) -> anyhow::Result<Vec<TransactionRecord>> {
    let ids: Vec<i64> = {
        let mut stmt = connection.prepare_cached(
            "SELECT id FROM event_transaction WHERE event_id = ?1 ORDER BY id",
        )?;
        let ids = stmt
            .query_map(params![&event_id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        ids
    };

    let mut records = ids
        .into_iter()
        .map(|id| require_transaction(connection, id).map(|(record, _)| record))
        .collect::<anyhow::Result<Vec<_>>>()?;

    records.sort_by(|t1, t2| t1.occurred_at.cmp(&t2.occurred_at).then(t1.id.cmp(&t2.id)));
    Ok(records)
}

pub fn snapshot(connection: &Connection, event_id: i64) -> anyhow::Result<EventSnapshot> {
    Ok(EventSnapshot {
        event: require_event(connection, event_id)?,
        transactions: transactions(connection, event_id)?,
    })
}
