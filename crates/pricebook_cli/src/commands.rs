use crate::cli::{Cli, Command};
use crate::error::CliError;
use log::debug;
use pricebook_core::db::open_db;
use pricebook_core::{parse_id, IntervalService, SqliteIntervalStore};
use serde_json::{json, Value};

/// Executes one command against the configured database and returns the
/// `data` payload.
pub fn run(cli: &Cli) -> Result<Value, CliError> {
    let conn = open_db(&cli.db)?;
    let service = IntervalService::new(SqliteIntervalStore::try_new(&conn)?);
    debug!(
        "event=cli_command module=cli status=start db={}",
        cli.db.display()
    );

    let data = match &cli.command {
        Command::List => serde_json::to_value(service.list_all()?)?,
        Command::Get { id } => serde_json::to_value(service.get(parse_id(id)?)?)?,
        Command::Insert(args) => {
            let candidate = args.to_input(None).into_interval()?;
            serde_json::to_value(service.save(candidate)?)?
        }
        Command::Update { id, interval } => {
            let candidate = interval.to_input(Some(id.clone())).into_interval()?;
            serde_json::to_value(service.save(candidate)?)?
        }
        Command::Delete { id } => {
            service.delete(parse_id(id)?)?;
            json!(["OK"])
        }
        Command::Clear => {
            service.delete_all()?;
            json!(["OK"])
        }
    };

    Ok(data)
}
