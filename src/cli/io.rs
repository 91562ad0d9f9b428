//! JSON output for the CLI
//!
//! - One JSON object per invocation on stdout
//! - Logs go to stderr, never stdout
//! - UTF-8 only

use std::io::{self, Write};

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::CliResult;

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Success envelope around `data`
pub fn ok_envelope<T: Serialize>(data: &T) -> CliResult<Value> {
    Ok(json!({
        "status": "ok",
        "data": serde_json::to_value(data)?
    }))
}

/// Error envelope
pub fn error_envelope(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    write_line(&ok_envelope(data)?)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = ok_envelope(&json!({"order": 3})).unwrap();
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["data"]["order"], 3);

        let err = error_envelope("ORDER_LOCKED_SCOPE", "busy");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "ORDER_LOCKED_SCOPE");
        assert_eq!(err["message"], "busy");
    }
}
