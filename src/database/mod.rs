//! Persistent storage of the ledger.

use chrono::{DateTime, Utc};

use crate::{
    error::LedgerResult,
    types::{
        Currency, Event, ParticipantOverview, Participation, Person, Totals, Transaction,
        TransactionOverview,
    },
};

pub mod sqlite;

/// This trait abstracts over the type of database.
///
/// Every method is a unit of work: it either applies all of its changes or,
/// when it returns an error, none of them.
pub trait Database {
    /// Get the list of all persons.
    fn get_all_persons(&self) -> LedgerResult<Vec<Person>>;

    /// Get the person with the given *person_id*.
    fn get_person(&self, person_id: i64) -> LedgerResult<Person>;

    /// Check whether a person has contributions, optionally restricted to an event
    /// and/or a transaction.
    ///
    /// All given ids must exist. The transaction must belong to the event and the
    /// person must take part in the event (or in the transaction, if given).
    fn person_has_contributions(
        &self,
        person_id: i64,
        event_id: Option<i64>,
        transaction_id: Option<i64>,
    ) -> LedgerResult<bool>;

    /// Create a person. The name is trimmed and must be unique.
    fn create_person(&mut self, name: &str) -> LedgerResult<Person>;

    /// Rename a person. The name is trimmed and must be unique.
    fn edit_person(&mut self, person_id: i64, name: &str) -> LedgerResult<Person>;

    /// Delete a person together with their contributions and all their
    /// event and transaction memberships.
    fn delete_person(&mut self, person_id: i64) -> LedgerResult<()>;

    /// Get the list of all events.
    fn get_all_events(&self) -> LedgerResult<Vec<Event>>;

    /// Get the event with the given *event_id*.
    fn get_event(&self, event_id: i64) -> LedgerResult<Event>;

    /// Check whether any transaction of the event has contributions.
    fn event_has_contributions(&self, event_id: i64) -> LedgerResult<bool>;

    /// Create an event with the given participants. All persons must exist.
    fn create_event(&mut self, name: &str, person_ids: &[i64]) -> LedgerResult<Event>;

    /// Rename an event and replace its participants.
    ///
    /// Removed participants lose their contributions and exclusions in the
    /// transactions of the event; added participants stop being extra
    /// participants there.
    fn edit_event(&mut self, event_id: i64, name: &str, person_ids: &[i64])
        -> LedgerResult<Event>;

    /// Delete an event with its currencies, transactions and contributions.
    fn delete_event(&mut self, event_id: i64) -> LedgerResult<()>;

    /// Get the currencies of an event.
    fn get_currencies_for_event(&self, event_id: i64) -> LedgerResult<Vec<Currency>>;

    /// Create a currency in an event.
    ///
    /// The first currency of an event becomes its base currency, with an
    /// exchange rate of 1 whatever rate is given.
    fn create_currency(
        &mut self,
        event_id: i64,
        name: &str,
        exchange_rate: f64,
    ) -> LedgerResult<Currency>;

    /// Rename a currency and change its exchange rate. The rate of the base
    /// currency cannot be changed.
    fn edit_currency(
        &mut self,
        currency_id: i64,
        name: &str,
        exchange_rate: f64,
    ) -> LedgerResult<Currency>;

    /// Make the given currency the base currency of its event, recomputing all
    /// other exchange rates. Returns all currencies of the event.
    fn set_base_currency(&mut self, currency_id: i64) -> LedgerResult<Vec<Currency>>;

    /// Delete a currency that is neither the base currency nor used by any contribution.
    fn delete_currency(&mut self, currency_id: i64) -> LedgerResult<()>;

    /// Get the transactions of an event, oldest first.
    fn get_transactions_for_event(&self, event_id: i64) -> LedgerResult<Vec<Transaction>>;

    /// Get the transaction with the given *transaction_id*.
    fn get_transaction(&self, transaction_id: i64) -> LedgerResult<Transaction>;

    /// Check whether a transaction has contributions.
    fn transaction_has_contributions(&self, transaction_id: i64) -> LedgerResult<bool>;

    /// Create a transaction in an event that has at least one currency.
    ///
    /// Extra persons must not be participants of the event, excluded persons must be.
    fn create_transaction(
        &mut self,
        event_id: i64,
        description: &str,
        occurred_at: DateTime<Utc>,
        extra_person_ids: &[i64],
        excluded_person_ids: &[i64],
    ) -> LedgerResult<Transaction>;

    /// Edit a transaction. Contributions of persons that no longer take part
    /// in the transaction are removed.
    fn edit_transaction(
        &mut self,
        transaction_id: i64,
        description: &str,
        occurred_at: DateTime<Utc>,
        extra_person_ids: &[i64],
        excluded_person_ids: &[i64],
    ) -> LedgerResult<Transaction>;

    /// Delete a transaction with its contributions.
    fn delete_transaction(&mut self, transaction_id: i64) -> LedgerResult<()>;

    /// Get one participation for each person taking part in the transaction.
    fn get_participations_for_transaction(
        &self,
        transaction_id: i64,
    ) -> LedgerResult<Vec<Participation>>;

    /// Set the contribution of a participant to a transaction, replacing any
    /// previous one.
    fn set_contribution(
        &mut self,
        transaction_id: i64,
        person_id: i64,
        amount: f64,
        currency_id: i64,
    ) -> LedgerResult<Participation>;

    /// Delete the contribution of a participant. If there is none, it is a no-op.
    fn delete_contribution(&mut self, transaction_id: i64, person_id: i64) -> LedgerResult<()>;

    /// Get the overview of every person taking part in the event.
    fn get_participant_overviews_for_event(
        &self,
        event_id: i64,
    ) -> LedgerResult<Vec<ParticipantOverview>>;

    /// Get the overview of every transaction of the event.
    fn get_transaction_overviews_for_event(
        &self,
        event_id: i64,
    ) -> LedgerResult<Vec<TransactionOverview>>;

    /// Get the totals of the event, including how to settle the balances.
    fn get_totals_for_event(&self, event_id: i64) -> LedgerResult<Totals>;
}
