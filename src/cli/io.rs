//! JSON output envelope
//!
//! - Success: `{"status":"ok","data":...}`
//! - Failure: `{"status":"error","code":...,"message":...}`
//! - One JSON object per line on stdout, UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&ok_envelope(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message))
}

pub fn ok_envelope(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

pub fn error_envelope(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let value = ok_envelope(json!({"target": "node-2"}));
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["target"], "node-2");
    }

    #[test]
    fn test_error_envelope() {
        let value = error_envelope("CONTINUITY_CLI_CONFIG_ERROR", "bad");
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "CONTINUITY_CLI_CONFIG_ERROR");
        assert_eq!(value["message"], "bad");
        assert!(value.get("data").is_none());
    }
}
