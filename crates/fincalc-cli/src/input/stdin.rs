use serde_json::Value;
use std::io::{self, Read};

/// Attempt to read a JSON calculator input from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive) or the pipe is empty, so the
/// caller falls back to command-line flags.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse JSON from stdin: {}", e))?;
    tracing::debug!(bytes = trimmed.len(), "read calculator input from stdin");
    Ok(Some(value))
}
