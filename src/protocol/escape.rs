use super::types::ProtocolError;

/// Escape a field for the engine's `:`-separated line format.
///
/// `%` doubles, and every byte below 0x20 plus `:` (plus `extra`, if given)
/// becomes `%` followed by the byte offset by 64.
pub fn escape(text: &str, extra: Option<u8>) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
            continue;
        }
        match u8::try_from(c) {
            Ok(b) if b < 0x20 || b == b':' || Some(b) == extra => {
                out.push('%');
                out.push(char::from(b + 64));
            }
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`].
pub fn unescape(text: &str) -> Result<String, ProtocolError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(e) => match u8::try_from(e) {
                Ok(b @ 64..=127) => out.push(char::from(b - 64)),
                _ => return Err(ProtocolError::BadEscape(e)),
            },
            None => return Err(ProtocolError::TrailingEscape),
        }
    }
    Ok(out)
}
