use tracing::warn;

use super::{Disposition, HandlerContext, MessageHandler};
use crate::lookup::Row;
use crate::protocol::types::Message;

/// Answers credential requests from the lookup service.
///
/// The first row's second column becomes the message result, regardless of
/// which user the engine asked about. When the lookup fails or returns no
/// usable row the message is left unhandled with an empty result; the
/// dispatcher acknowledges it either way.
pub struct CredentialHandler;

impl MessageHandler for CredentialHandler {
    fn disposition(&self) -> Disposition {
        Disposition::Owned
    }

    fn handle(&self, message: &mut Message, cx: &mut HandlerContext<'_>) {
        let rows = match cx.lookup.query(&cx.settings.query) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(id = %message.id, "credential lookup failed: {e}");
                cx.diagnostic(format!("credential lookup failed: {e}"));
                return;
            }
        };

        let Some((username, password)) = first_credential(&rows) else {
            warn!(id = %message.id, "credential lookup returned no usable rows");
            cx.diagnostic("credential lookup returned no rows");
            return;
        };

        let shown = if cx.settings.show_secrets {
            password
        } else {
            "<redacted>"
        };
        cx.diagnostic(format!("Username: {username} password: {shown}"));

        message.retval = password.to_string();
        message.handled = true;
    }
}

/// Columns 0 and 1 of the first row, by position.
fn first_credential(rows: &[Row]) -> Option<(&str, &str)> {
    let row = rows.first()?;
    Some((row.first()?.as_str(), row.get(1)?.as_str()))
}
