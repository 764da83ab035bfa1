use std::fmt::Write as _;

use super::escape::escape;
use super::types::Message;

/// Format an `install` request for writing to the engine.
pub fn format_install(name: &str, priority: u32) -> String {
    format!("%%>install:{priority}:{}", escape(name, None))
}

/// Format the acknowledgment for a message we were asked to process.
///
/// Carries the final `handled`/`retval` and echoes every parameter back.
pub fn format_acknowledge(msg: &Message) -> String {
    let mut line = format!(
        "%%<message:{}:{}:{}:{}",
        escape(&msg.id, None),
        msg.handled,
        escape(&msg.name, None),
        escape(&msg.retval, None),
    );
    for (key, value) in &msg.params {
        let _ = write!(line, ":{}={}", escape(key, Some(b'=')), escape(value, None));
    }
    line
}

/// Format an unhandled answer for an incoming message we could not decode.
///
/// `wire_id` is echoed exactly as received, so it is not escaped again.
pub fn format_reject(wire_id: &str) -> String {
    format!("%%<message:{wire_id}:false::")
}

/// Format a diagnostic line for the engine's log.
///
/// Output text is not escaped by the engine, so line breaks are folded to
/// spaces to keep the framing intact.
pub fn format_output(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("%%>output:{folded}")
}

/// Format a request to change one of the engine's per-module settings.
pub fn format_setlocal(name: &str, value: &str) -> String {
    format!("%%>setlocal:{}:{}", escape(name, None), escape(value, None))
}
