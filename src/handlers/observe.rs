use super::{Disposition, HandlerContext, MessageHandler};
use crate::protocol::types::{Message, category};

/// Logs answers to messages we dispatched.
pub struct AnswerObserver;

impl MessageHandler for AnswerObserver {
    fn disposition(&self) -> Disposition {
        Disposition::Observed
    }

    fn handle(&self, message: &mut Message, cx: &mut HandlerContext<'_>) {
        cx.diagnostic(format!("Answered: {} id: {}", message.name, message.id));
    }
}

/// Logs install and uninstall confirmations.
pub struct InstallObserver;

impl MessageHandler for InstallObserver {
    fn disposition(&self) -> Disposition {
        Disposition::Observed
    }

    fn handle(&self, message: &mut Message, cx: &mut HandlerContext<'_>) {
        let verb = if message.category == category::UNINSTALLED {
            "Uninstalled"
        } else {
            "Installed"
        };
        cx.diagnostic(format!("{verb}: {}", message.name));
    }
}

/// Logs anything no other handler claims.
pub struct FallbackObserver;

impl MessageHandler for FallbackObserver {
    fn disposition(&self) -> Disposition {
        Disposition::Observed
    }

    fn handle(&self, message: &mut Message, cx: &mut HandlerContext<'_>) {
        cx.diagnostic(format!("Event: {}", message.category));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerSettings;
    use crate::handlers::testing::{FixedRows, rows};

    fn observe(handler: &dyn MessageHandler, msg: &Message) -> (Message, Vec<String>) {
        let lookup = FixedRows(rows(&[["alice", "secret1"]]));
        let settings = HandlerSettings {
            module_name: "auth".to_string(),
            query: String::new(),
            show_secrets: false,
        };
        let mut cx = HandlerContext::new(&lookup, &settings);
        let mut seen = msg.clone();
        handler.handle(&mut seen, &mut cx);
        (seen, cx.into_diagnostics())
    }

    fn message(cat: &str, name: &str, id: &str) -> Message {
        let mut msg = Message::new(cat);
        msg.name = name.to_string();
        msg.id = id.to_string();
        msg.retval = "untouched".to_string();
        msg
    }

    #[test]
    fn answer_names_message_and_id() {
        let msg = message(category::ANSWER, "engine.status", "abc");
        let (seen, lines) = observe(&AnswerObserver, &msg);
        assert_eq!(lines, vec!["auth: Answered: engine.status id: abc"]);
        assert_eq!(seen, msg);
    }

    #[test]
    fn install_and_uninstall_name_the_message() {
        let msg = message(category::INSTALLED, "user.auth", "");
        let (seen, lines) = observe(&InstallObserver, &msg);
        assert_eq!(lines, vec!["auth: Installed: user.auth"]);
        assert_eq!(seen, msg);

        let msg = message(category::UNINSTALLED, "user.auth", "");
        let (seen, lines) = observe(&InstallObserver, &msg);
        assert_eq!(lines, vec!["auth: Uninstalled: user.auth"]);
        assert_eq!(seen, msg);
    }

    #[test]
    fn fallback_names_the_category() {
        let msg = message("watched", "call.cdr", "");
        let (seen, lines) = observe(&FallbackObserver, &msg);
        assert_eq!(lines, vec!["auth: Event: watched"]);
        assert_eq!(seen, msg);
    }

    #[test]
    fn observers_are_not_owners() {
        assert_eq!(AnswerObserver.disposition(), Disposition::Observed);
        assert_eq!(InstallObserver.disposition(), Disposition::Observed);
        assert_eq!(FallbackObserver.disposition(), Disposition::Observed);
    }
}
