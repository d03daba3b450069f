//! The implementation of a data storage using Sqlite.
//!
//! Every operation runs in its own Sqlite transaction. Business rule
//! violations are raised as `LedgerError` inside `anyhow` and recovered by
//! `map_error`; any other failure becomes a `DatabaseError`.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use rusqlite::Connection;

use crate::{
    error::{DatabaseError, LedgerError, LedgerResult},
    report,
    types::{
        Currency, Event, EventSnapshot, ParticipantOverview, Participation, Person, Totals,
        Transaction, TransactionOverview,
    },
    validator::{
        validate_contribution_amount, validate_description, validate_exchange_rate, validate_name,
    },
};

use super::Database;

mod currencies;
mod events;
mod load;
mod persons;
mod schema;
mod transactions;

pub struct SqliteDatabase {
    connection: Connection,
}

impl SqliteDatabase {
    /// Open (or create) the database stored at *path*.
    pub fn new<P: AsRef<Path>>(path: P) -> LedgerResult<SqliteDatabase> {
        info!("Opening database at {}", path.as_ref().display());
        let connection = Connection::open(path)
            .map_err(|e| DatabaseError::new("cannot open database", e.into()))?;
        Self::with_connection(connection)
    }

    /// Open a database that only lives in memory.
    pub fn in_memory() -> LedgerResult<SqliteDatabase> {
        let connection = Connection::open_in_memory()
            .map_err(|e| DatabaseError::new("cannot open database", e.into()))?;
        Self::with_connection(connection)
    }

    /// Load everything the reports need within a single read transaction.
    fn read_snapshot(&self, event_id: i64) -> anyhow::Result<EventSnapshot> {
        let tx = self.connection.unchecked_transaction()?;
        let snapshot = load::snapshot(&tx, event_id)?;
        tx.commit()?;
        Ok(snapshot)
    }

    fn with_connection(connection: Connection) -> LedgerResult<SqliteDatabase> {
        schema::create_all_tables(&connection)
            .map_err(|e| DatabaseError::new("cannot create tables", e))?;
        Ok(SqliteDatabase { connection })
    }
}

fn unique_ids(ids: &[i64]) -> HashSet<i64> {
    ids.iter().copied().collect()
}

impl Database for SqliteDatabase {
    fn get_all_persons(&self) -> LedgerResult<Vec<Person>> {
        persons::get_all(&self.connection).map_err(|e| map_error("cannot get persons", e))
    }

    fn get_person(&self, person_id: i64) -> LedgerResult<Person> {
        persons::get(&self.connection, person_id).map_err(|e| map_error("cannot get person", e))
    }

    fn person_has_contributions(
        &self,
        person_id: i64,
        event_id: Option<i64>,
        transaction_id: Option<i64>,
    ) -> LedgerResult<bool> {
        persons::has_contributions(&self.connection, person_id, event_id, transaction_id)
            .map_err(|e| map_error("cannot check if person has contributions", e))
    }

    fn create_person(&mut self, name: &str) -> LedgerResult<Person> {
        let name = validate_name(name)?;
        persons::create(&mut self.connection, &name)
            .map_err(|e| map_error("cannot create person", e))
    }

    fn edit_person(&mut self, person_id: i64, name: &str) -> LedgerResult<Person> {
        let name = validate_name(name)?;
        persons::edit(&mut self.connection, person_id, &name)
            .map_err(|e| map_error("cannot edit person", e))
    }

    fn delete_person(&mut self, person_id: i64) -> LedgerResult<()> {
        persons::delete(&mut self.connection, person_id)
            .map_err(|e| map_error("cannot delete person", e))
    }

    fn get_all_events(&self) -> LedgerResult<Vec<Event>> {
        events::get_all(&self.connection).map_err(|e| map_error("cannot get events", e))
    }

    fn get_event(&self, event_id: i64) -> LedgerResult<Event> {
        events::get(&self.connection, event_id).map_err(|e| map_error("cannot get event", e))
    }

    fn event_has_contributions(&self, event_id: i64) -> LedgerResult<bool> {
        events::has_contributions(&self.connection, event_id)
            .map_err(|e| map_error("cannot check if event has contributions", e))
    }

    fn create_event(&mut self, name: &str, person_ids: &[i64]) -> LedgerResult<Event> {
        let name = validate_name(name)?;
        events::create(&mut self.connection, &name, &unique_ids(person_ids))
            .map_err(|e| map_error("cannot create event", e))
    }

    fn edit_event(
        &mut self,
        event_id: i64,
        name: &str,
        person_ids: &[i64],
    ) -> LedgerResult<Event> {
        let name = validate_name(name)?;
        events::edit(&mut self.connection, event_id, &name, &unique_ids(person_ids))
            .map_err(|e| map_error("cannot edit event", e))
    }

    fn delete_event(&mut self, event_id: i64) -> LedgerResult<()> {
        events::delete(&mut self.connection, event_id)
            .map_err(|e| map_error("cannot delete event", e))
    }

    fn get_currencies_for_event(&self, event_id: i64) -> LedgerResult<Vec<Currency>> {
        currencies::for_event(&self.connection, event_id)
            .map_err(|e| map_error("cannot get currencies", e))
    }

    fn create_currency(
        &mut self,
        event_id: i64,
        name: &str,
        exchange_rate: f64,
    ) -> LedgerResult<Currency> {
        let name = validate_name(name)?;
        validate_exchange_rate(exchange_rate)?;
        currencies::create(&mut self.connection, event_id, &name, exchange_rate)
            .map_err(|e| map_error("cannot create currency", e))
    }

    fn edit_currency(
        &mut self,
        currency_id: i64,
        name: &str,
        exchange_rate: f64,
    ) -> LedgerResult<Currency> {
        let name = validate_name(name)?;
        validate_exchange_rate(exchange_rate)?;
        currencies::edit(&mut self.connection, currency_id, &name, exchange_rate)
            .map_err(|e| map_error("cannot edit currency", e))
    }

    fn set_base_currency(&mut self, currency_id: i64) -> LedgerResult<Vec<Currency>> {
        currencies::set_base(&mut self.connection, currency_id)
            .map_err(|e| map_error("cannot set base currency", e))
    }

    fn delete_currency(&mut self, currency_id: i64) -> LedgerResult<()> {
        currencies::delete(&mut self.connection, currency_id)
            .map_err(|e| map_error("cannot delete currency", e))
    }

    fn get_transactions_for_event(&self, event_id: i64) -> LedgerResult<Vec<Transaction>> {
        transactions::for_event(&self.connection, event_id)
            .map_err(|e| map_error("cannot get transactions", e))
    }

    fn get_transaction(&self, transaction_id: i64) -> LedgerResult<Transaction> {
        transactions::get(&self.connection, transaction_id)
            .map_err(|e| map_error("cannot get transaction", e))
    }

    fn transaction_has_contributions(&self, transaction_id: i64) -> LedgerResult<bool> {
        transactions::has_contributions(&self.connection, transaction_id)
            .map_err(|e| map_error("cannot check if transaction has contributions", e))
    }

    fn create_transaction(
        &mut self,
        event_id: i64,
        description: &str,
        occurred_at: DateTime<Utc>,
        extra_person_ids: &[i64],
        excluded_person_ids: &[i64],
    ) -> LedgerResult<Transaction> {
        let description = validate_description(description)?;
        transactions::create(
            &mut self.connection,
            event_id,
            &description,
            occurred_at,
            &unique_ids(extra_person_ids),
            &unique_ids(excluded_person_ids),
        )
        .map_err(|e| map_error("cannot create transaction", e))
    }

    fn edit_transaction(
        &mut self,
        transaction_id: i64,
        description: &str,
        occurred_at: DateTime<Utc>,
        extra_person_ids: &[i64],
        excluded_person_ids: &[i64],
    ) -> LedgerResult<Transaction> {
        let description = validate_description(description)?;
        transactions::edit(
            &mut self.connection,
            transaction_id,
            &description,
            occurred_at,
            &unique_ids(extra_person_ids),
            &unique_ids(excluded_person_ids),
        )
        .map_err(|e| map_error("cannot edit transaction", e))
    }

    fn delete_transaction(&mut self, transaction_id: i64) -> LedgerResult<()> {
        transactions::delete(&mut self.connection, transaction_id)
            .map_err(|e| map_error("cannot delete transaction", e))
    }

    fn get_participations_for_transaction(
        &self,
        transaction_id: i64,
    ) -> LedgerResult<Vec<Participation>> {
        transactions::participations_for(&self.connection, transaction_id)
            .map_err(|e| map_error("cannot get participations", e))
    }

    fn set_contribution(
        &mut self,
        transaction_id: i64,
        person_id: i64,
        amount: f64,
        currency_id: i64,
    ) -> LedgerResult<Participation> {
        validate_contribution_amount(amount)?;
        transactions::set_contribution(
            &mut self.connection,
            transaction_id,
            person_id,
            amount,
            currency_id,
        )
        .map_err(|e| map_error("cannot set contribution", e))
    }

    fn delete_contribution(&mut self, transaction_id: i64, person_id: i64) -> LedgerResult<()> {
        transactions::delete_contribution(&mut self.connection, transaction_id, person_id)
            .map_err(|e| map_error("cannot delete contribution", e))
    }

    fn get_participant_overviews_for_event(
        &self,
        event_id: i64,
    ) -> LedgerResult<Vec<ParticipantOverview>> {
        self.read_snapshot(event_id)
            .map(|snapshot| report::participant_overviews(&snapshot))
            .map_err(|e| map_error("cannot get participant overviews", e))
    }

    fn get_transaction_overviews_for_event(
        &self,
        event_id: i64,
    ) -> LedgerResult<Vec<TransactionOverview>> {
        self.read_snapshot(event_id)
            .map(|snapshot| report::transaction_overviews(&snapshot))
            .map_err(|e| map_error("cannot get transaction overviews", e))
    }

    fn get_totals_for_event(&self, event_id: i64) -> LedgerResult<Totals> {
        self.read_snapshot(event_id)
            .map(|snapshot| report::totals(&snapshot))
            .map_err(|e| map_error("cannot get totals", e))
    }
}

fn map_error<T: AsRef<str>>(message: T, e: anyhow::Error) -> LedgerError {
    match e.downcast::<LedgerError>() {
        Ok(e) => e,
        Err(e) => DatabaseError::new(message, e).into(),
    }
}
