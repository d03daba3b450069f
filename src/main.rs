use anyhow::Context;
use clap::Parser;
use log::{error, info};

use kitty_rs::args::Args;
use kitty_rs::database::{sqlite::SqliteDatabase, Database};
use kitty_rs::formatter::{format_simple_list, format_totals};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    pretty_env_logger::init();

    info!("Initializing database...");
    let database = SqliteDatabase::new(args.database_path())
        .map_err(|e| {
            error!("Cannot initialize database: {}", e);
            e
        })
        .context("cannot initialize database")?;

    let events = database.get_all_events()?;

    let event_name = match args.event() {
        Some(name) => name,
        None => {
            let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
            println!("Events:\n{}", format_simple_list(&names));
            return Ok(());
        }
    };

    let event = events
        .iter()
        .find(|e| e.name == event_name)
        .with_context(|| format!("event `{event_name}` does not exist"))?;

    let totals = database.get_totals_for_event(event.id)?;
    println!("{}", format_totals(&totals));

    Ok(())
}
