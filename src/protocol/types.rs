/// Message categories the engine produces.
///
/// The set is open-ended: anything not listed here still parses and is routed
/// to the fallback observer.
pub mod category {
    /// A message the engine asks us to process (`%%>message`).
    pub const INCOMING: &str = "incoming";
    /// The engine's answer to a message we dispatched (`%%<message`).
    pub const ANSWER: &str = "answer";
    /// Confirmation of an `install` request.
    pub const INSTALLED: &str = "installed";
    /// Confirmation of an `uninstall` request.
    pub const UNINSTALLED: &str = "uninstalled";
    pub const WATCHED: &str = "watched";
    pub const UNWATCHED: &str = "unwatched";
    pub const SETLOCAL: &str = "setlocal";
    pub const QUIT: &str = "quit";
}

/// A single protocol notification from the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub category: String,
    /// Opaque correlation id; echoed back verbatim on acknowledge.
    pub id: String,
    pub name: String,
    pub retval: String,
    pub handled: bool,
    /// Engine timestamp in seconds (incoming messages only).
    pub time: Option<u64>,
    /// Priority reported by install/uninstall answers.
    pub priority: Option<u32>,
    /// Message parameters in wire order.
    pub params: Vec<(String, String)>,
}

impl Message {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Self::default()
        }
    }

    /// Look up the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Why a line from the engine could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid escape sequence '%{0}'")]
    BadEscape(char),
    #[error("line ends inside an escape sequence")]
    TrailingEscape,
    #[error("'{tag}' line is missing field {index}")]
    MissingField { tag: &'static str, index: usize },
    #[error("field '{field}' is not a number: {value:?}")]
    BadNumber { field: &'static str, value: String },
    #[error("unrecognized line: {0:?}")]
    UnknownLine(String),
    /// An incoming message whose id could be read but whose body could not.
    /// `id` is the field as it appeared on the wire, still escaped.
    #[error("incoming message {id} is malformed: {reason}")]
    MalformedIncoming {
        id: String,
        #[source]
        reason: Box<ProtocolError>,
    },
}
