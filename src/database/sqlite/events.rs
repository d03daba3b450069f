use std::collections::HashSet;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{error::LedgerError, types::Event};

use super::load;

const DELETE_EVENT_CONTRIBUTIONS_OF_PERSON: &str = "DELETE FROM contribution
     WHERE person_id = ?1
     AND transaction_id IN (SELECT id FROM event_transaction WHERE event_id = ?2)
     AND NOT EXISTS (SELECT 1 FROM extra_participant x
                     WHERE x.transaction_id = contribution.transaction_id
                     AND x.person_id = contribution.person_id)";

const DELETE_EVENT_EXCLUSIONS_OF_PERSON: &str = "DELETE FROM excluded_participant
     WHERE person_id = ?1
     AND transaction_id IN (SELECT id FROM event_transaction WHERE event_id = ?2)";

const DELETE_EVENT_EXTRAS_OF_PERSON: &str = "DELETE FROM extra_participant
     WHERE person_id = ?1
     AND transaction_id IN (SELECT id FROM event_transaction WHERE event_id = ?2)";

pub fn get_all(connection: &Connection) -> anyhow::Result<Vec<Event>> {
    let ids: Vec<i64> = {
        let mut stmt = connection.prepare_cached("SELECT id FROM event ORDER BY id")?;
        let ids = stmt
            .query_map((), |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        ids
    };

    ids.into_iter()
        .map(|id| load::require_event(connection, id))
        .collect()
}

pub fn get(connection: &Connection, event_id: i64) -> anyhow::Result<Event> {
    load::require_event(connection, event_id)
}

pub fn has_contributions(connection: &Connection, event_id: i64) -> anyhow::Result<bool> {
    load::require_event(connection, event_id)?;

    let has_contributions = connection.query_row(
        "SELECT EXISTS(
           SELECT 1 FROM contribution c
           INNER JOIN event_transaction t ON c.transaction_id = t.id
           WHERE t.event_id = ?1
         )",
        params![&event_id],
        |row| row.get(0),
    )?;
    Ok(has_contributions)
}

fn name_taken(connection: &Connection, name: &str, except_id: Option<i64>) -> anyhow::Result<bool> {
    let id: Option<i64> = connection
        .query_row(
            "SELECT id FROM event WHERE name = ?1 AND (?2 IS NULL OR id <> ?2)",
            params![&name, &except_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.is_some())
}

pub fn create(
    connection: &mut Connection,
    name: &str,
    person_ids: &HashSet<i64>,
) -> anyhow::Result<Event> {
    let tx = connection.transaction()?;

    if name_taken(&tx, name, None)? {
        return Err(LedgerError::event_exists(name).into());
    }
    load::require_persons(&tx, person_ids)?;

    let event_id: i64 = tx.query_row(
        "INSERT INTO event (name) VALUES (?1) RETURNING id",
        params![&name],
        |row| row.get(0),
    )?;
    debug!("event_id is {event_id}");

    {
        let mut insert_participant_stmt =
            tx.prepare_cached("INSERT INTO event_person (event_id, person_id) VALUES (?1, ?2)")?;
        for person_id in person_ids {
            insert_participant_stmt.execute(params![&event_id, person_id])?;
        }
    }

    let event = load::require_event(&tx, event_id)?;
    tx.commit()?;

    Ok(event)
}

pub fn edit(
    connection: &mut Connection,
    event_id: i64,
    name: &str,
    person_ids: &HashSet<i64>,
) -> anyhow::Result<Event> {
    let tx = connection.transaction()?;

    let event = load::require_event(&tx, event_id)?;
    if name_taken(&tx, name, Some(event_id))? {
        return Err(LedgerError::event_exists(name).into());
    }
    load::require_persons(&tx, person_ids)?;

    tx.execute(
        "UPDATE event SET name = ?1 WHERE id = ?2",
        params![&name, &event_id],
    )?;

    let current: HashSet<i64> = event.participants.iter().map(|p| p.id).collect();

    for person_id in current.difference(person_ids) {
        debug!("Removing person {person_id} from event {event_id}");
        tx.execute(
            DELETE_EVENT_CONTRIBUTIONS_OF_PERSON,
            params![person_id, &event_id],
        )?;
        tx.execute(
            DELETE_EVENT_EXCLUSIONS_OF_PERSON,
            params![person_id, &event_id],
        )?;
        tx.execute(
            "DELETE FROM event_person WHERE event_id = ?1 AND person_id = ?2",
            params![&event_id, person_id],
        )?;
    }

    for person_id in person_ids.difference(&current) {
        debug!("Adding person {person_id} to event {event_id}");
        // An event participant takes part in every transaction unless excluded.
        tx.execute(DELETE_EVENT_EXTRAS_OF_PERSON, params![person_id, &event_id])?;
        tx.execute(
            "INSERT INTO event_person (event_id, person_id) VALUES (?1, ?2)",
            params![&event_id, person_id],
        )?;
    }

    let event = load::require_event(&tx, event_id)?;
    tx.commit()?;

    Ok(event)
}

pub fn delete(connection: &mut Connection, event_id: i64) -> anyhow::Result<()> {
    debug!("Deleting event. Event ID: {event_id}");
    let tx = connection.transaction()?;

    load::require_event(&tx, event_id)?;

    tx.execute(
        "DELETE FROM contribution
         WHERE transaction_id IN (SELECT id FROM event_transaction WHERE event_id = ?1)",
        params![&event_id],
    )?;
    tx.execute(
        "DELETE FROM extra_participant
         WHERE transaction_id IN (SELECT id FROM event_transaction WHERE event_id = ?1)",
        params![&event_id],
    )?;
    tx.execute(
        "DELETE FROM excluded_participant
         WHERE transaction_id IN (SELECT id FROM event_transaction WHERE event_id = ?1)",
        params![&event_id],
    )?;
    tx.execute(
        "DELETE FROM event_transaction WHERE event_id = ?1",
        params![&event_id],
    )?;
    tx.execute(
        "DELETE FROM currency WHERE event_id = ?1",
        params![&event_id],
    )?;
    tx.execute(
        "DELETE FROM event_person WHERE event_id = ?1",
        params![&event_id],
    )?;
    tx.execute("DELETE FROM event WHERE id = ?1", params![&event_id])?;

    tx.commit()?;

    Ok(())
}
