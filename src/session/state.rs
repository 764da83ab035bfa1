/// Tracks accumulated dispatcher state across events.
#[derive(Debug, Default)]
pub struct SessionState {
    pub status: SessionStatus,
    pub summary: RunSummary,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created; installs and local settings may still be sent.
    #[default]
    Starting,
    /// Inside the dispatch loop.
    Running,
    /// The event source reported `Disconnected`.
    Ended,
}

/// Counters reported at shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Calls made to the event source, including the final `Disconnected`.
    pub polls: u64,
    pub idle: u64,
    /// Messages routed to a handler that owns them.
    pub owned: u64,
    /// Messages routed to a read-only observer.
    pub observed: u64,
    pub acknowledged: u64,
}
