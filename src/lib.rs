use config::Config;
use dispatch::{Dispatcher, Shutdown};
use handlers::standard_registry;
use lookup::LookupService;
use session::{Engine, EventSource};
use tracing::debug;

pub mod config;
pub mod dispatch;
pub mod event;
pub mod handlers;
pub mod logging;
pub mod lookup;
pub mod protocol;
pub mod registry;
pub mod session;

/// Run the module against an engine session: send the configured locals and
/// installs, then dispatch until the engine disconnects.
pub async fn run_module<S, L>(session: S, lookup: L, config: &Config) -> Shutdown<S>
where
    S: EventSource + Engine,
    L: LookupService,
{
    let mut dispatcher = Dispatcher::new(
        session,
        standard_registry(),
        lookup,
        config.handler_settings(),
    );
    for (name, value) in &config.locals {
        dispatcher.set_local(name, value).await;
    }
    for entry in &config.installs {
        dispatcher.install(&entry.name, entry.priority).await;
    }
    for (rank, installation) in dispatcher.registry().by_precedence().iter().enumerate() {
        debug!(
            rank,
            category = %installation.category,
            priority = installation.priority,
            "handler precedence"
        );
    }
    dispatcher.run().await
}
