use crate::protocol::types::Message;

/// One poll's worth of input, consumed by the dispatcher's loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The session has ended. No further events will arrive.
    Disconnected,
    /// Nothing is pending right now.
    Idle,
    /// A notification from the engine.
    Message(Message),
}
