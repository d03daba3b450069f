use log::{debug, info};
use rusqlite::{params, Connection};

use crate::{currency::rebase, error::LedgerError, types::Currency};

use super::load;

pub fn for_event(connection: &Connection, event_id: i64) -> anyhow::Result<Vec<Currency>> {
    load::require_event(connection, event_id)?;
    load::currencies(connection, event_id)
}

pub fn create(
    connection: &mut Connection,
    event_id: i64,
    name: &str,
    exchange_rate: f64,
) -> anyhow::Result<Currency> {
    let tx = connection.transaction()?;

    let event = load::require_event(&tx, event_id)?;
    let currencies = load::currencies(&tx, event_id)?;

    if currencies.iter().any(|c| c.name == name) {
        return Err(LedgerError::currency_exists(name, &event.name).into());
    }

    // The first currency of an event is its base currency.
    let is_base = currencies.is_empty();
    let exchange_rate = if is_base { 1.0 } else { exchange_rate };

    let currency_id: i64 = tx.query_row(
        "INSERT INTO currency (event_id, name, exchange_rate, is_base) VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
        params![&event_id, &name, &exchange_rate, &is_base],
        |row| row.get(0),
    )?;
    debug!("currency_id is {currency_id}");

    tx.commit()?;

    Ok(Currency::new(currency_id, name, exchange_rate, is_base))
}

pub fn edit(
    connection: &mut Connection,
    currency_id: i64,
    name: &str,
    exchange_rate: f64,
) -> anyhow::Result<Currency> {
    let tx = connection.transaction()?;

    let (currency, event_id) = load::require_currency(&tx, currency_id)?;
    let event = load::require_event(&tx, event_id)?;

    let name_taken = load::currencies(&tx, event_id)?
        .iter()
        .any(|c| c.id != currency_id && c.name == name);
    if name_taken {
        return Err(LedgerError::currency_exists(name, &event.name).into());
    }

    if currency.is_base && exchange_rate != 1.0 {
        return Err(LedgerError::not_allowed(
            "the exchange rate must be 1 on the base currency".to_string(),
        )
        .into());
    }

    tx.execute(
        "UPDATE currency SET name = ?1, exchange_rate = ?2 WHERE id = ?3",
        params![&name, &exchange_rate, &currency_id],
    )?;

    tx.commit()?;

    Ok(Currency::new(currency_id, name, exchange_rate, currency.is_base))
}

pub fn set_base(connection: &mut Connection, currency_id: i64) -> anyhow::Result<Vec<Currency>> {
    let tx = connection.transaction()?;

    let (_, event_id) = load::require_currency(&tx, currency_id)?;
    let currencies = load::currencies(&tx, event_id)?;

    // All new rates are validated here, before anything is written.
    let rebased = rebase(&currencies, currency_id)?;

    {
        let mut update_stmt = tx.prepare_cached(
            "UPDATE currency SET exchange_rate = ?1, is_base = ?2 WHERE id = ?3",
        )?;
        for currency in &rebased {
            update_stmt.execute(params![
                &currency.exchange_rate,
                &currency.is_base,
                &currency.id
            ])?;
        }
    }

    tx.commit()?;
    info!("Currency {currency_id} is now the base currency of event {event_id}");

    Ok(rebased)
}

pub fn delete(connection: &mut Connection, currency_id: i64) -> anyhow::Result<()> {
    debug!("Deleting currency. Currency ID: {currency_id}");
    let tx = connection.transaction()?;

    let (currency, _) = load::require_currency(&tx, currency_id)?;

    if currency.is_base {
        return Err(LedgerError::not_allowed(format!(
            "currency (id: {currency_id}) is the base currency and cannot be deleted"
        ))
        .into());
    }

    let in_use: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM contribution WHERE currency_id = ?1)",
        params![&currency_id],
        |row| row.get(0),
    )?;
    if in_use {
        return Err(LedgerError::not_allowed(format!(
            "currency (id: {currency_id}) is in use in transactions and cannot be deleted"
        ))
        .into());
    }

    tx.execute("DELETE FROM currency WHERE id = ?1", params![&currency_id])?;

    tx.commit()?;

    Ok(())
}
