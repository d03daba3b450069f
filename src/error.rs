use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Every failure that an operation on the ledger can report.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not allowed: {0}")]
    NotAllowed(String),

    #[error("{0}")]
    AlreadyDefined(String),

    #[error("{0}")]
    NotDefined(String),

    #[error("{0}")]
    OutOfRange(String),

    #[error("inconsistent arguments: {0}")]
    ArgumentInconsistent(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Error, Debug)]
#[error("{message}: {source}")]
pub struct DatabaseError {
    message: String,
    source: anyhow::Error,
}

impl DatabaseError {
    pub fn new<T: AsRef<str>>(message: T, source: anyhow::Error) -> Self {
        DatabaseError {
            message: message.as_ref().to_string(),
            source,
        }
    }
}

impl LedgerError {
    pub fn person_not_found(person_id: i64) -> Self {
        LedgerError::NotFound(format!("person (id: {person_id}) does not exist"))
    }

    pub fn event_not_found(event_id: i64) -> Self {
        LedgerError::NotFound(format!("event (id: {event_id}) does not exist"))
    }

    pub fn currency_not_found(currency_id: i64) -> Self {
        LedgerError::NotFound(format!("currency (id: {currency_id}) does not exist"))
    }

    pub fn transaction_not_found(transaction_id: i64) -> Self {
        LedgerError::NotFound(format!(
            "transaction (id: {transaction_id}) does not exist"
        ))
    }

    pub fn persons_not_found(which: &str) -> Self {
        LedgerError::NotFound(format!("not all {which} exist"))
    }

    pub fn person_exists(name: &str) -> Self {
        LedgerError::AlreadyExists(format!("a person with name `{name}` already exists"))
    }

    pub fn event_exists(name: &str) -> Self {
        LedgerError::AlreadyExists(format!("an event with name `{name}` already exists"))
    }

    pub fn currency_exists(name: &str, event_name: &str) -> Self {
        LedgerError::AlreadyExists(format!(
            "a currency with name `{name}` already exists in event `{event_name}`"
        ))
    }

    pub fn validation(message: String) -> Self {
        LedgerError::Validation(message)
    }

    pub fn not_allowed(message: String) -> Self {
        LedgerError::NotAllowed(message)
    }

    pub fn extra_already_member() -> Self {
        LedgerError::AlreadyDefined(
            "some of the extra persons are already part of the event".to_string(),
        )
    }

    pub fn excluded_not_member() -> Self {
        LedgerError::NotDefined("not all excluded persons are part of the event".to_string())
    }

    pub fn not_a_participant(person_id: i64, transaction_id: i64) -> Self {
        LedgerError::NotDefined(format!(
            "person (id: {person_id}) is not a participant of transaction (id: {transaction_id})"
        ))
    }

    pub fn exchange_rate_out_of_range(currency_name: &str, rate: f64) -> Self {
        LedgerError::OutOfRange(format!(
            "exchange rate for currency `{currency_name}` would become {rate}, which is not allowed"
        ))
    }

    pub fn argument_inconsistent(message: String) -> Self {
        LedgerError::ArgumentInconsistent(message)
    }
}
