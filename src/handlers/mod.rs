//! Per-category message handlers.
//!
//! A handler either owns the messages routed to it (it computes a result and
//! the dispatcher acknowledges the message exactly once afterward) or merely
//! observes them (logging only, nothing is sent back).

pub mod incoming;
pub mod observe;

use crate::lookup::LookupService;
use crate::protocol::types::{Message, category};
use crate::registry::HandlerRegistry;

/// Whether messages routed to a handler carry an acknowledgment obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The engine waits for our answer; acknowledge once `handle` returns.
    Owned,
    /// Informational only; never acknowledged.
    Observed,
}

/// Settings handlers read while processing a message.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Prefix for diagnostic lines.
    pub module_name: String,
    /// Statement sent to the lookup service for credential requests.
    pub query: String,
    /// Show looked-up passwords in clear text in diagnostic lines.
    pub show_secrets: bool,
}

/// What a handler may touch besides the message itself.
pub struct HandlerContext<'a> {
    pub lookup: &'a dyn LookupService,
    pub settings: &'a HandlerSettings,
    diagnostics: Vec<String>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(lookup: &'a dyn LookupService, settings: &'a HandlerSettings) -> Self {
        Self {
            lookup,
            settings,
            diagnostics: Vec::new(),
        }
    }

    /// Queue a diagnostic line for the engine's log, prefixed with the module name.
    pub fn diagnostic(&mut self, text: impl AsRef<str>) {
        self.diagnostics
            .push(format!("{}: {}", self.settings.module_name, text.as_ref()));
    }

    pub fn into_diagnostics(self) -> Vec<String> {
        self.diagnostics
    }
}

pub trait MessageHandler {
    fn disposition(&self) -> Disposition;

    /// Process one message. Owned handlers finalize `retval`/`handled` here;
    /// observers must leave the message untouched.
    fn handle(&self, message: &mut Message, cx: &mut HandlerContext<'_>);
}

/// The registry this module runs with: credential requests are answered,
/// everything else is logged.
pub fn standard_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new(Box::new(observe::FallbackObserver));
    registry.bind(category::INCOMING, Box::new(incoming::CredentialHandler));
    registry.bind(category::ANSWER, Box::new(observe::AnswerObserver));
    registry.bind(category::INSTALLED, Box::new(observe::InstallObserver));
    registry.bind(category::UNINSTALLED, Box::new(observe::InstallObserver));
    registry
}
