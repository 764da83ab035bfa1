//! The dispatcher's view of the engine connection.
//!
//! Inbound traffic arrives through [`EventSource`]; everything we send goes
//! through [`Engine`]. Neither side reports transport failures to the caller:
//! a broken connection shows up as [`Event::Disconnected`] on the next poll.

pub mod runner;
pub mod state;

use crate::event::Event;
use crate::protocol::types::Message;
use crate::registry::Installation;

/// Supplies the next protocol event.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Return the next event, or `Event::Idle` promptly if nothing is pending.
    async fn next_event(&mut self) -> Event;
}

/// Requests sent to the engine. All of them are fire-and-forget.
#[allow(async_fn_in_trait)]
pub trait Engine {
    /// Ask the engine to route messages named `installation.category` to us.
    async fn install(&mut self, installation: &Installation);

    /// Change one of the engine's per-module settings.
    async fn set_local(&mut self, name: &str, value: &str);

    /// Return a message we were asked to process, with its final result.
    async fn acknowledge(&mut self, message: &Message);

    /// Write a diagnostic line to the engine's log.
    async fn output(&mut self, line: &str);
}
