use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection};

use crate::{
    error::LedgerError,
    report::{participation, participations, summarize_transaction},
    types::{Participation, Person, Transaction, TransactionRecord},
    validator::validate_transaction_participants,
};

use super::load;

fn is_participant(members: &[Person], record: &TransactionRecord, person_id: i64) -> bool {
    record
        .effective_participants(members)
        .iter()
        .any(|p| p.id == person_id)
}

/// Load a transaction and the participants of its event.
fn require_with_members(
    connection: &Connection,
    transaction_id: i64,
) -> anyhow::Result<(TransactionRecord, Vec<Person>)> {
    let (record, event_id) = load::require_transaction(connection, transaction_id)?;
    let members = load::event_participants(connection, event_id)?;
    Ok((record, members))
}

pub fn for_event(connection: &Connection, event_id: i64) -> anyhow::Result<Vec<Transaction>> {
    let event = load::require_event(connection, event_id)?;
    let transactions = load::transactions(connection, event_id)?
        .iter()
        .map(|t| summarize_transaction(&event.participants, t))
        .collect();
    Ok(transactions)
}

pub fn get(connection: &Connection, transaction_id: i64) -> anyhow::Result<Transaction> {
    let (record, members) = require_with_members(connection, transaction_id)?;
    Ok(summarize_transaction(&members, &record))
}

pub fn has_contributions(connection: &Connection, transaction_id: i64) -> anyhow::Result<bool> {
    load::require_transaction(connection, transaction_id)?;

    let has_contributions = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM contribution WHERE transaction_id = ?1)",
        params![&transaction_id],
        |row| row.get(0),
    )?;
    Ok(has_contributions)
}

fn check_participants(
    connection: &Connection,
    members: &[Person],
    extra_persons: &HashSet<i64>,
    excluded_persons: &HashSet<i64>,
) -> anyhow::Result<()> {
    let all_person_ids = load::all_person_ids(connection)?;
    let event_person_ids: HashSet<_> = members.iter().map(|p| p.id).collect();
    validate_transaction_participants(
        extra_persons,
        excluded_persons,
        &all_person_ids,
        &event_person_ids,
    )?;
    Ok(())
}

fn insert_participants(
    connection: &Connection,
    transaction_id: i64,
    extra_persons: &HashSet<i64>,
    excluded_persons: &HashSet<i64>,
) -> anyhow::Result<()> {
    let mut insert_extra_stmt = connection.prepare_cached(
        "INSERT INTO extra_participant (transaction_id, person_id) VALUES (?1, ?2)",
    )?;
    for person_id in extra_persons {
        insert_extra_stmt.execute(params![&transaction_id, person_id])?;
    }

    let mut insert_excluded_stmt = connection.prepare_cached(
        "INSERT INTO excluded_participant (transaction_id, person_id) VALUES (?1, ?2)",
    )?;
    for person_id in excluded_persons {
        insert_excluded_stmt.execute(params![&transaction_id, person_id])?;
    }

    Ok(())
}

pub fn create(
    connection: &mut Connection,
    event_id: i64,
    description: &str,
    occurred_at: DateTime<Utc>,
    extra_persons: &HashSet<i64>,
    excluded_persons: &HashSet<i64>,
) -> anyhow::Result<Transaction> {
    let tx = connection.transaction()?;

    let event = load::require_event(&tx, event_id)?;
    if load::currencies(&tx, event_id)?.is_empty() {
        return Err(LedgerError::not_allowed(format!(
            "event (id: {event_id}) must have a currency before adding a transaction"
        ))
        .into());
    }
    check_participants(&tx, &event.participants, extra_persons, excluded_persons)?;

    let transaction_id: i64 = tx.query_row(
        "INSERT INTO event_transaction (event_id, description, occurred_at) VALUES (?1, ?2, ?3)
         RETURNING id",
        params![&event_id, &description, &occurred_at],
        |row| row.get(0),
    )?;
    debug!("transaction_id is {transaction_id}");

    insert_participants(&tx, transaction_id, extra_persons, excluded_persons)?;

    let (record, _) = load::require_transaction(&tx, transaction_id)?;
    tx.commit()?;

    Ok(summarize_transaction(&event.participants, &record))
}

pub fn edit(
    connection: &mut Connection,
    transaction_id: i64,
    description: &str,
    occurred_at: DateTime<Utc>,
    extra_persons: &HashSet<i64>,
    excluded_persons: &HashSet<i64>,
) -> anyhow::Result<Transaction> {
    let tx = connection.transaction()?;

    let (_, members) = require_with_members(&tx, transaction_id)?;
    check_participants(&tx, &members, extra_persons, excluded_persons)?;

    tx.execute(
        "UPDATE event_transaction SET description = ?1, occurred_at = ?2 WHERE id = ?3",
        params![&description, &occurred_at, &transaction_id],
    )?;

    tx.execute(
        "DELETE FROM extra_participant WHERE transaction_id = ?1",
        params![&transaction_id],
    )?;
    tx.execute(
        "DELETE FROM excluded_participant WHERE transaction_id = ?1",
        params![&transaction_id],
    )?;
    insert_participants(&tx, transaction_id, extra_persons, excluded_persons)?;

    // Remove the contributions of persons that no longer take part.
    let (record, _) = load::require_transaction(&tx, transaction_id)?;
    for contribution in &record.contributions {
        if !is_participant(&members, &record, contribution.person.id) {
            debug!(
                "Removing contribution {} of person {} from transaction {transaction_id}",
                contribution.id, contribution.person.id
            );
            tx.execute(
                "DELETE FROM contribution WHERE id = ?1",
                params![&contribution.id],
            )?;
        }
    }

    let (record, _) = load::require_transaction(&tx, transaction_id)?;
    tx.commit()?;

    Ok(summarize_transaction(&members, &record))
}

pub fn delete(connection: &mut Connection, transaction_id: i64) -> anyhow::Result<()> {
    debug!("Deleting transaction. Transaction ID: {transaction_id}");
    let tx = connection.transaction()?;

    load::require_transaction(&tx, transaction_id)?;

    tx.execute(
        "DELETE FROM contribution WHERE transaction_id = ?1",
        params![&transaction_id],
    )?;
    tx.execute(
        "DELETE FROM extra_participant WHERE transaction_id = ?1",
        params![&transaction_id],
    )?;
    tx.execute(
        "DELETE FROM excluded_participant WHERE transaction_id = ?1",
        params![&transaction_id],
    )?;
    tx.execute(
        "DELETE FROM event_transaction WHERE id = ?1",
        params![&transaction_id],
    )?;

    tx.commit()?;

    Ok(())
}

pub fn participations_for(
    connection: &Connection,
    transaction_id: i64,
) -> anyhow::Result<Vec<Participation>> {
    let (record, members) = require_with_members(connection, transaction_id)?;
    Ok(participations(&members, &record))
}

pub fn set_contribution(
    connection: &mut Connection,
    transaction_id: i64,
    person_id: i64,
    amount: f64,
    currency_id: i64,
) -> anyhow::Result<Participation> {
    let tx = connection.transaction()?;

    let (record, event_id) = load::require_transaction(&tx, transaction_id)?;
    let person = load::require_person(&tx, person_id)?;
    let (_, currency_event_id) = load::require_currency(&tx, currency_id)?;

    if currency_event_id != event_id {
        return Err(LedgerError::not_allowed(format!(
            "currency (id: {currency_id}) does not belong to the event of \
             transaction (id: {transaction_id})"
        ))
        .into());
    }

    let members = load::event_participants(&tx, event_id)?;
    if !is_participant(&members, &record, person_id) {
        return Err(LedgerError::not_a_participant(person_id, transaction_id).into());
    }

    tx.execute(
        "INSERT INTO contribution (transaction_id, person_id, amount, currency_id)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(transaction_id, person_id)
         DO UPDATE SET amount = excluded.amount, currency_id = excluded.currency_id",
        params![&transaction_id, &person_id, &amount, &currency_id],
    )?;

    let (record, _) = load::require_transaction(&tx, transaction_id)?;
    tx.commit()?;

    Ok(participation(&person, &record))
}

pub fn delete_contribution(
    connection: &mut Connection,
    transaction_id: i64,
    person_id: i64,
) -> anyhow::Result<()> {
    debug!("Deleting contribution. Transaction ID: {transaction_id}. Person ID: {person_id}");
    let tx = connection.transaction()?;

    let (record, members) = require_with_members(&tx, transaction_id)?;
    load::require_person(&tx, person_id)?;

    if !is_participant(&members, &record, person_id) {
        return Err(LedgerError::not_a_participant(person_id, transaction_id).into());
    }

    tx.execute(
        "DELETE FROM contribution WHERE transaction_id = ?1 AND person_id = ?2",
        params![&transaction_id, &person_id],
    )?;

    tx.commit()?;

    Ok(())
}
