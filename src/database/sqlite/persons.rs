use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{error::LedgerError, types::Person};

use super::load;

pub fn get_all(connection: &Connection) -> anyhow::Result<Vec<Person>> {
    let mut stmt = connection.prepare_cached("SELECT id, name FROM person ORDER BY id")?;
    let persons = stmt
        .query_map((), |row| {
            Ok(Person {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(persons)
}

pub fn get(connection: &Connection, person_id: i64) -> anyhow::Result<Person> {
    load::require_person(connection, person_id)
}

pub fn has_contributions(
    connection: &Connection,
    person_id: i64,
    event_id: Option<i64>,
    transaction_id: Option<i64>,
) -> anyhow::Result<bool> {
    load::require_person(connection, person_id)?;
    if let Some(event_id) = event_id {
        load::require_event(connection, event_id)?;
    }
    let transaction = match transaction_id {
        Some(transaction_id) => Some(load::require_transaction(connection, transaction_id)?),
        None => None,
    };

    match (event_id, &transaction) {
        (Some(event_id), Some((record, transaction_event_id))) => {
            if *transaction_event_id != event_id {
                return Err(LedgerError::argument_inconsistent(format!(
                    "transaction (id: {}) does not belong to event (id: {event_id})",
                    record.id
                ))
                .into());
            }
        }
        (Some(event_id), None) => {
            let is_member = load::event_participants(connection, event_id)?
                .iter()
                .any(|p| p.id == person_id);
            if !is_member {
                return Err(LedgerError::argument_inconsistent(format!(
                    "person (id: {person_id}) does not belong to event (id: {event_id})"
                ))
                .into());
            }
        }
        _ => {}
    }

    if let Some((record, transaction_event_id)) = &transaction {
        let members = load::event_participants(connection, *transaction_event_id)?;
        let takes_part = record
            .effective_participants(&members)
            .iter()
            .any(|p| p.id == person_id);
        if !takes_part {
            return Err(LedgerError::argument_inconsistent(format!(
                "person (id: {person_id}) does not belong to transaction (id: {})",
                record.id
            ))
            .into());
        }
    }

    let has_contributions = connection.query_row(
        "SELECT EXISTS(
           SELECT 1 FROM contribution c
           INNER JOIN event_transaction t ON c.transaction_id = t.id
           WHERE c.person_id = ?1
           AND (?2 IS NULL OR c.transaction_id = ?2)
           AND (?3 IS NULL OR t.event_id = ?3)
         )",
        params![&person_id, &transaction_id, &event_id],
        |row| row.get(0),
    )?;
    Ok(has_contributions)
}

fn name_taken(connection: &Connection, name: &str, except_id: Option<i64>) -> anyhow::Result<bool> {
    let id: Option<i64> = connection
        .query_row(
            "SELECT id FROM person WHERE name = ?1 AND (?2 IS NULL OR id <> ?2)",
            params![&name, &except_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.is_some())
}

pub fn create(connection: &mut Connection, name: &str) -> anyhow::Result<Person> {
    let tx = connection.transaction()?;

    if name_taken(&tx, name, None)? {
        return Err(LedgerError::person_exists(name).into());
    }

    let person_id: i64 = tx.query_row(
        "INSERT INTO person (name) VALUES (?1) RETURNING id",
        params![&name],
        |row| row.get(0),
    )?;
    debug!("person_id is {person_id}");

    tx.commit()?;

    Ok(Person::new(person_id, name))
}

pub fn edit(connection: &mut Connection, person_id: i64, name: &str) -> anyhow::Result<Person> {
    let tx = connection.transaction()?;

    load::require_person(&tx, person_id)?;
    if name_taken(&tx, name, Some(person_id))? {
        return Err(LedgerError::person_exists(name).into());
    }

    tx.execute(
        "UPDATE person SET name = ?1 WHERE id = ?2",
        params![&name, &person_id],
    )?;

    tx.commit()?;

    Ok(Person::new(person_id, name))
}

pub fn delete(connection: &mut Connection, person_id: i64) -> anyhow::Result<()> {
    debug!("Deleting person. Person ID: {person_id}");
    let tx = connection.transaction()?;

    load::require_person(&tx, person_id)?;

    tx.execute(
        "DELETE FROM contribution WHERE person_id = ?1",
        params![&person_id],
    )?;
    tx.execute(
        "DELETE FROM extra_participant WHERE person_id = ?1",
        params![&person_id],
    )?;
    tx.execute(
        "DELETE FROM excluded_participant WHERE person_id = ?1",
        params![&person_id],
    )?;
    tx.execute(
        "DELETE FROM event_person WHERE person_id = ?1",
        params![&person_id],
    )?;
    tx.execute("DELETE FROM person WHERE id = ?1", params![&person_id])?;

    tx.commit()?;

    Ok(())
}
