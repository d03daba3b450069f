//! Command line interface of the `kitty` binary.

use std::path::PathBuf;

use clap::Parser;

/// kitty: print the totals of an event and who pays whom to settle it.
///
/// Without an event, the events stored in the database are listed.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    /// The SQLite file holding the ledger. It is created if missing.
    #[arg(long, env = "KITTY_DATABASE", default_value = "kitty.db")]
    database_path: PathBuf,

    /// The name of the event to report on.
    event: Option<String>,
}

impl Args {
    pub fn database_path(&self) -> &PathBuf {
        &self.database_path
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref().map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_and_database() {
        let args = Args::try_parse_from(["kitty", "--database-path", "/tmp/trip.db", " Trip "])
            .expect("test");
        assert_eq!(args.database_path(), &PathBuf::from("/tmp/trip.db"));
        assert_eq!(args.event(), Some("Trip"));
    }

    #[test]
    fn test_event_is_optional() {
        let args = Args::try_parse_from(["kitty", "--database-path", "trip.db"]).expect("test");
        assert_eq!(args.event(), None);
    }

    #[test]
    fn test_default_database() {
        // The variable overrides the default, so only check without it.
        if std::env::var_os("KITTY_DATABASE").is_none() {
            let args = Args::try_parse_from(["kitty"]).expect("test");
            assert_eq!(args.database_path(), &PathBuf::from("kitty.db"));
        }
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["kitty", "--verbose"]).is_err());
    }
}
