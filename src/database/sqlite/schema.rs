const CREATE_PERSON_TABLE: &str = "CREATE TABLE IF NOT EXISTS person (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE
)";

const CREATE_EVENT_TABLE: &str = "CREATE TABLE IF NOT EXISTS event (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE
)";

const CREATE_EVENT_PERSON_TABLE: &str = "CREATE TABLE IF NOT EXISTS event_person (
  event_id INTEGER NOT NULL,
  person_id INTEGER NOT NULL,
  UNIQUE(event_id, person_id)
)";

const CREATE_CURRENCY_TABLE: &str = "CREATE TABLE IF NOT EXISTS currency (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  event_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  exchange_rate REAL NOT NULL,
  is_base BOOL NOT NULL,
  UNIQUE(event_id, name)
)";

// `transaction` is a keyword in SQL.
const CREATE_TRANSACTION_TABLE: &str = "CREATE TABLE IF NOT EXISTS event_transaction (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  event_id INTEGER NOT NULL,
  description TEXT NOT NULL,
  occurred_at DATETIME NOT NULL
)";

const CREATE_EXTRA_PARTICIPANT_TABLE: &str = "CREATE TABLE IF NOT EXISTS extra_participant (
  transaction_id INTEGER NOT NULL,
  person_id INTEGER NOT NULL,
  UNIQUE(transaction_id, person_id)
)";

const CREATE_EXCLUDED_PARTICIPANT_TABLE: &str = "CREATE TABLE IF NOT EXISTS excluded_participant (
  transaction_id INTEGER NOT NULL,
  person_id INTEGER NOT NULL,
  UNIQUE(transaction_id, person_id)
)";

const CREATE_CONTRIBUTION_TABLE: &str = "CREATE TABLE IF NOT EXISTS contribution (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  transaction_id INTEGER NOT NULL,
  person_id INTEGER NOT NULL,
  amount REAL NOT NULL,
  currency_id INTEGER NOT NULL,
  UNIQUE(transaction_id, person_id)
)";

pub fn create_all_tables(connection: &rusqlite::Connection) -> anyhow::Result<()> {
    connection.execute(CREATE_PERSON_TABLE, ())?;
    connection.execute(CREATE_EVENT_TABLE, ())?;
    connection.execute(CREATE_EVENT_PERSON_TABLE, ())?;
    connection.execute(CREATE_CURRENCY_TABLE, ())?;
    connection.execute(CREATE_TRANSACTION_TABLE, ())?;
    connection.execute(CREATE_EXTRA_PARTICIPANT_TABLE, ())?;
    connection.execute(CREATE_EXCLUDED_PARTICIPANT_TABLE, ())?;
    connection.execute(CREATE_CONTRIBUTION_TABLE, ())?;
    Ok(())
}
