//! Category routing and installed interest.
//!
//! Two tables live here. Handlers are keyed by message category and resolved
//! once per message, with a fallback for anything unbound. Installations record
//! which engine messages we asked to receive and at what priority; they are
//! written before the loop starts and never change afterward.

use std::collections::HashMap;

use crate::handlers::MessageHandler;

/// A standing request to receive engine messages named `category`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub category: String,
    /// Lower runs earlier in the engine's handler chain.
    pub priority: u32,
}

pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn MessageHandler>>,
    fallback: Box<dyn MessageHandler>,
    installations: Vec<Installation>,
}

impl HandlerRegistry {
    /// Create a registry that routes every category to `fallback`.
    pub fn new(fallback: Box<dyn MessageHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
            installations: Vec::new(),
        }
    }

    /// Bind `handler` to `category`, replacing any previous binding.
    pub fn bind(&mut self, category: impl Into<String>, handler: Box<dyn MessageHandler>) {
        self.handlers.insert(category.into(), handler);
    }

    /// The handler for `category`, or the fallback.
    pub fn resolve(&self, category: &str) -> &dyn MessageHandler {
        self.handlers
            .get(category)
            .map_or(&*self.fallback, |handler| &**handler)
    }

    /// Record an installation. Duplicates are kept; the engine decides between them.
    pub fn record(&mut self, category: impl Into<String>, priority: u32) -> &Installation {
        self.installations.push(Installation {
            category: category.into(),
            priority,
        });
        &self.installations[self.installations.len() - 1]
    }

    /// Installations in the order they were requested.
    pub fn installations(&self) -> &[Installation] {
        &self.installations
    }

    /// Installations in evaluation order: ascending priority, ties by request order.
    pub fn by_precedence(&self) -> Vec<&Installation> {
        let mut ordered: Vec<&Installation> = self.installations.iter().collect();
        ordered.sort_by_key(|i| i.priority);
        ordered
    }
}
