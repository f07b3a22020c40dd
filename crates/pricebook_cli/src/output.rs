use crate::error::CliError;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

#[derive(Serialize)]
struct DataEnvelope<'a> {
    data: &'a Value,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    message: String,
}

/// Writes `{"data": ...}` to stdout.
pub fn render(data: &Value, pretty: bool) -> Result<(), CliError> {
    let envelope = DataEnvelope { data };
    let text = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

/// Writes `{"message": ...}` to stderr. Never fails.
pub fn render_error(error: &CliError) {
    let envelope = ErrorEnvelope {
        message: error.to_string(),
    };
    match serde_json::to_string(&envelope) {
        Ok(text) => eprintln!("{text}"),
        Err(_) => eprintln!("error: {error}"),
    }
}
