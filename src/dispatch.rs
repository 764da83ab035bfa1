use tracing::{debug, info};

use crate::event::Event;
use crate::handlers::{Disposition, HandlerContext, HandlerSettings};
use crate::lookup::LookupService;
use crate::protocol::types::Message;
use crate::registry::HandlerRegistry;
use crate::session::state::{RunSummary, SessionState, SessionStatus};
use crate::session::{Engine, EventSource};

/// What `run` hands back once the engine is gone.
pub struct Shutdown<S> {
    pub session: S,
    pub summary: RunSummary,
}

/// The module's event loop.
///
/// Setup (`set_local`, `install`) happens on `&mut self`; `run` consumes the
/// dispatcher, so nothing can be installed once messages are flowing.
pub struct Dispatcher<S, L> {
    session: S,
    registry: HandlerRegistry,
    lookup: L,
    settings: HandlerSettings,
    state: SessionState,
}

impl<S, L> Dispatcher<S, L>
where
    S: EventSource + Engine,
    L: LookupService,
{
    pub fn new(
        session: S,
        registry: HandlerRegistry,
        lookup: L,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            session,
            registry,
            lookup,
            settings,
            state: SessionState::default(),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> SessionStatus {
        self.state.status
    }

    /// Change one of the engine's per-module settings before the loop starts.
    pub async fn set_local(&mut self, name: &str, value: &str) {
        debug!(name, value, "setting engine local");
        self.session.set_local(name, value).await;
    }

    /// Ask the engine to route `category` messages to us at `priority`.
    pub async fn install(&mut self, category: &str, priority: u32) {
        let installation = self.registry.record(category, priority);
        info!(category, priority, "installing");
        self.session.install(installation).await;
    }

    /// Pull and dispatch events until the engine disconnects.
    pub async fn run(mut self) -> Shutdown<S> {
        self.state.status = SessionStatus::Running;
        loop {
            let event = self.session.next_event().await;
            self.state.summary.polls += 1;
            match event {
                Event::Disconnected => break,
                Event::Idle => self.state.summary.idle += 1,
                Event::Message(message) => self.dispatch(message).await,
            }
        }
        self.state.status = SessionStatus::Ended;

        let summary = self.state.summary;
        info!(
            owned = summary.owned,
            observed = summary.observed,
            acknowledged = summary.acknowledged,
            "engine disconnected"
        );
        let bye = format!("{}: bye!", self.settings.module_name);
        self.session.output(&bye).await;

        Shutdown {
            session: self.session,
            summary,
        }
    }

    async fn dispatch(&mut self, mut message: Message) {
        let handler = self.registry.resolve(&message.category);
        let disposition = handler.disposition();
        let mut cx = HandlerContext::new(&self.lookup, &self.settings);
        handler.handle(&mut message, &mut cx);
        let diagnostics = cx.into_diagnostics();

        for line in &diagnostics {
            debug!("{line}");
            self.session.output(line).await;
        }

        match disposition {
            Disposition::Owned => {
                self.state.summary.owned += 1;
                debug!(
                    id = %message.id,
                    handled = message.handled,
                    "acknowledging {}",
                    message.name
                );
                self.session.acknowledge(&message).await;
                self.state.summary.acknowledged += 1;
            }
            Disposition::Observed => self.state.summary.observed += 1,
        }
    }
}
