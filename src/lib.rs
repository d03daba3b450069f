//! Bookkeeping of shared expenses: persons take part in events, pay for
//! transactions in several currencies and settle up at the end.

pub mod args;
pub mod currency;
pub mod database;
pub mod error;
pub mod formatter;
pub mod report;
pub mod settlement;
pub mod types;
pub mod validator;
