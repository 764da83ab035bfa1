use super::escape::unescape;
use super::types::{Message, ProtocolError, category};

/// Parse a single line from the engine into a `Message`.
///
/// Returns `Ok(None)` for empty lines and for the engine's `Error in:`
/// complaints about our own output (those carry nothing to dispatch).
/// Returns `Err` for malformed lines (caller should warn, not crash).
pub fn parse_line(line: &str) -> Result<Option<Message>, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() || line.starts_with("Error in:") {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(':').collect();
    let fields = Fields {
        tag: tag_of(parts[0]),
        parts: &parts,
    };

    let msg = match parts[0] {
        "%%>message" => parse_incoming(&fields).map_err(|reason| match parts.get(1) {
            Some(id) if !id.is_empty() => ProtocolError::MalformedIncoming {
                id: (*id).to_string(),
                reason: Box::new(reason),
            },
            _ => reason,
        })?,
        "%%<message" => {
            let mut msg = Message::new(category::ANSWER);
            msg.id = fields.text(1)?;
            msg.handled = fields.flag(2)?;
            msg.name = fields.text(3)?;
            msg.retval = fields.text(4)?;
            msg.params = fields.params(5)?;
            msg
        }
        "%%<install" | "%%<uninstall" => {
            let cat = if parts[0] == "%%<install" {
                category::INSTALLED
            } else {
                category::UNINSTALLED
            };
            let mut msg = Message::new(cat);
            msg.priority = Some(fields.number("priority", 1)?);
            msg.name = fields.text(2)?;
            msg.handled = fields.flag(3)?;
            msg
        }
        "%%<watch" | "%%<unwatch" => {
            let cat = if parts[0] == "%%<watch" {
                category::WATCHED
            } else {
                category::UNWATCHED
            };
            let mut msg = Message::new(cat);
            msg.name = fields.text(1)?;
            msg.handled = fields.flag(2)?;
            msg
        }
        "%%<setlocal" => {
            let mut msg = Message::new(category::SETLOCAL);
            msg.name = fields.text(1)?;
            msg.retval = fields.text(2)?;
            msg.handled = fields.flag(3)?;
            msg
        }
        "%%<quit" => Message::new(category::QUIT),
        _ => return Err(ProtocolError::UnknownLine(line.to_string())),
    };
    Ok(Some(msg))
}

/// The engine is waiting on an answer for these, so a failure here keeps the
/// raw id to let the session reject the message.
fn parse_incoming(fields: &Fields<'_>) -> Result<Message, ProtocolError> {
    let mut msg = Message::new(category::INCOMING);
    msg.id = fields.text(1)?;
    msg.time = Some(fields.number("time", 2)?);
    msg.name = fields.text(3)?;
    msg.retval = fields.text(4)?;
    msg.params = fields.params(5)?;
    Ok(msg)
}

fn tag_of(head: &str) -> &'static str {
    match head {
        "%%>message" => "message",
        "%%<message" => "answer",
        "%%<install" => "install",
        "%%<uninstall" => "uninstall",
        "%%<watch" => "watch",
        "%%<unwatch" => "unwatch",
        "%%<setlocal" => "setlocal",
        _ => "line",
    }
}

/// Positional access to the `:`-separated fields of one line.
struct Fields<'a> {
    tag: &'static str,
    parts: &'a [&'a str],
}

impl Fields<'_> {
    fn raw(&self, index: usize) -> Result<&str, ProtocolError> {
        self.parts
            .get(index)
            .copied()
            .ok_or(ProtocolError::MissingField {
                tag: self.tag,
                index,
            })
    }

    fn text(&self, index: usize) -> Result<String, ProtocolError> {
        unescape(self.raw(index)?)
    }

    fn flag(&self, index: usize) -> Result<bool, ProtocolError> {
        Ok(self.raw(index)? == "true")
    }

    fn number<T: std::str::FromStr>(
        &self,
        field: &'static str,
        index: usize,
    ) -> Result<T, ProtocolError> {
        let raw = self.raw(index)?;
        raw.parse().map_err(|_| ProtocolError::BadNumber {
            field,
            value: raw.to_string(),
        })
    }

    /// Decode trailing `key=value` fields starting at `from`.
    fn params(&self, from: usize) -> Result<Vec<(String, String)>, ProtocolError> {
        self.parts
            .iter()
            .skip(from)
            .map(|&part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                Ok::<_, ProtocolError>((unescape(key)?, unescape(value)?))
            })
            .collect()
    }
}
