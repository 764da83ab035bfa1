use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use super::{Engine, EventSource};
use crate::event::Event;
use crate::protocol::emit::{
    format_acknowledge, format_install, format_output, format_reject, format_setlocal,
};
use crate::protocol::parse::parse_line;
use crate::protocol::types::{Message, ProtocolError};
use crate::registry::Installation;

/// What the reader task hands to the session.
enum Inbound {
    Event(Event),
    /// An incoming message that could not be decoded; the engine still
    /// expects an answer for `wire_id`.
    Reject { wire_id: String },
}

/// Speaks the engine's line protocol over a pair of byte streams.
///
/// In production these are the process's stdin and stdout. A background task
/// reads and parses lines; `next_event` waits at most `idle_interval` for one
/// before reporting `Idle`. Lines are decoded lossily, so stray non-UTF-8
/// bytes never end the session. Writes are still attempted after the input closes,
/// so a parting diagnostic line can go out.
pub struct StdioSession<W> {
    events: mpsc::UnboundedReceiver<Inbound>,
    writer: W,
    idle_interval: Duration,
    /// The engine closed its end of our input.
    input_closed: bool,
    /// A write failed; nothing more will be sent.
    output_broken: bool,
}

impl<W: AsyncWrite + Unpin> StdioSession<W> {
    /// Start reading engine lines from `reader` and return a session that
    /// writes its requests to `writer`.
    pub fn spawn<R>(reader: R, writer: W, idle_interval: Duration) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (event_tx, events) = mpsc::unbounded_channel();
        Self::spawn_reader(reader, event_tx);
        Self {
            events,
            writer,
            idle_interval,
            input_closed: false,
            output_broken: false,
        }
    }

    /// Give back the writer, e.g. to inspect what was sent.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn spawn_reader<R>(reader: R, event_tx: mpsc::UnboundedSender<Inbound>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("failed to read from engine: {e}");
                        break;
                    }
                }
                let line = String::from_utf8_lossy(&buf);
                trace!(line = %line.trim_end(), "engine -> module");
                let inbound = match parse_line(&line) {
                    Ok(Some(msg)) => Inbound::Event(Event::Message(msg)),
                    Ok(None) => Inbound::Event(Event::Idle),
                    Err(ProtocolError::MalformedIncoming { id, reason }) => {
                        warn!(id = %id, "rejecting malformed incoming message: {reason}");
                        Inbound::Reject { wire_id: id }
                    }
                    Err(e) => {
                        warn!("failed to parse engine line: {e}");
                        Inbound::Event(Event::Idle)
                    }
                };
                if event_tx.send(inbound).is_err() {
                    return;
                }
            }

            // stdin closed, the engine dropped us
            let _ = event_tx.send(Inbound::Event(Event::Disconnected));
        });
    }

    async fn send_line(&mut self, line: &str) {
        if self.output_broken {
            return;
        }
        trace!(line = %line, "module -> engine");
        let result = async {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            self.writer.flush().await
        }
        .await;
        if let Err(e) = result {
            warn!("failed to write to engine: {e}");
            self.output_broken = true;
        }
    }
}

impl<W: AsyncWrite + Unpin> EventSource for StdioSession<W> {
    async fn next_event(&mut self) -> Event {
        if self.input_closed || self.output_broken {
            return Event::Disconnected;
        }
        match tokio::time::timeout(self.idle_interval, self.events.recv()).await {
            Err(_elapsed) => Event::Idle,
            Ok(Some(Inbound::Event(Event::Disconnected)) | None) => {
                self.input_closed = true;
                Event::Disconnected
            }
            Ok(Some(Inbound::Event(event))) => event,
            Ok(Some(Inbound::Reject { wire_id })) => {
                self.send_line(&format_reject(&wire_id)).await;
                Event::Idle
            }
        }
    }
}

impl<W: AsyncWrite + Unpin> Engine for StdioSession<W> {
    async fn install(&mut self, installation: &Installation) {
        let line = format_install(&installation.category, installation.priority);
        self.send_line(&line).await;
    }

    async fn set_local(&mut self, name: &str, value: &str) {
        self.send_line(&format_setlocal(name, value)).await;
    }

    async fn acknowledge(&mut self, message: &Message) {
        self.send_line(&format_acknowledge(message)).await;
    }

    async fn output(&mut self, line: &str) {
        self.send_line(&format_output(line)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::types::category;

    const IDLE: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn yields_messages_then_disconnects() {
        let input: &[u8] = b"%%<install:10:user.auth:true\n%%>message:1:5:user.auth:\n";
        let mut session = StdioSession::spawn(input, Vec::new(), IDLE);

        let Event::Message(msg) = session.next_event().await else {
            panic!("expected install answer");
        };
        assert_eq!(msg.category, category::INSTALLED);
        let Event::Message(msg) = session.next_event().await else {
            panic!("expected incoming message");
        };
        assert_eq!(msg.category, category::INCOMING);
        assert_eq!(session.next_event().await, Event::Disconnected);
        // Stays disconnected without touching the channel again.
        assert_eq!(session.next_event().await, Event::Disconnected);

        session.output("bye").await;
        assert_eq!(session.into_writer(), b"%%>output:bye\n");
    }

    #[tokio::test]
    async fn empty_and_garbage_lines_are_idle() {
        let input: &[u8] = b"\nnot a protocol line\nError in:%%>bogus\n";
        let mut session = StdioSession::spawn(input, Vec::new(), IDLE);

        assert_eq!(session.next_event().await, Event::Idle);
        assert_eq!(session.next_event().await, Event::Idle);
        assert_eq!(session.next_event().await, Event::Idle);
        assert_eq!(session.next_event().await, Event::Disconnected);
    }

    #[tokio::test]
    async fn non_utf8_line_does_not_end_session() {
        let input: &[u8] =
            b"%%>message:1:5:call.cdr::caller=Jos\xe9\n%%>message:2:5:user.auth:\n";
        let mut session = StdioSession::spawn(input, Vec::new(), IDLE);

        let Event::Message(msg) = session.next_event().await else {
            panic!("expected the latin-1 message");
        };
        assert_eq!(msg.id, "1");
        assert_eq!(msg.param("caller"), Some("Jos\u{fffd}"));
        let Event::Message(msg) = session.next_event().await else {
            panic!("expected the following message");
        };
        assert_eq!(msg.id, "2");
        assert_eq!(msg.name, "user.auth");
        assert_eq!(session.next_event().await, Event::Disconnected);
    }

    #[tokio::test]
    async fn malformed_incoming_is_answered_unhandled() {
        let input: &[u8] = b"%%>message:7:5:user.auth::note=%1x\n%%>message:8:5:user.auth:\n";
        let mut session = StdioSession::spawn(input, Vec::new(), IDLE);

        let mut delivered = Vec::new();
        loop {
            match session.next_event().await {
                Event::Disconnected => break,
                Event::Idle => {}
                Event::Message(msg) => delivered.push(msg.id),
            }
        }
        assert_eq!(delivered, vec!["8"]);
        assert_eq!(session.into_writer(), b"%%<message:7:false::\n");
    }

    #[tokio::test]
    async fn quiet_engine_yields_idle() {
        let (_engine_end, module_end) = tokio::io::duplex(64);
        let mut session = StdioSession::spawn(module_end, Vec::new(), IDLE);
        assert_eq!(session.next_event().await, Event::Idle);
    }

    #[tokio::test]
    async fn writes_protocol_lines() {
        let input: &[u8] = b"";
        let mut session = StdioSession::spawn(input, Vec::new(), IDLE);

        session
            .install(&Installation {
                category: "user.auth".to_string(),
                priority: 10,
            })
            .await;
        session.set_local("timeout", "5000").await;
        session.output("hello").await;

        let mut msg = Message::new(category::INCOMING);
        msg.id = "1".to_string();
        msg.name = "user.auth".to_string();
        msg.retval = "secret".to_string();
        msg.handled = true;
        session.acknowledge(&msg).await;

        let written = String::from_utf8(session.into_writer()).unwrap();
        assert_eq!(
            written,
            "%%>install:10:user.auth\n\
             %%>setlocal:timeout:5000\n\
             %%>output:hello\n\
             %%<message:1:true:user.auth:secret\n"
        );
    }

    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn write_failure_becomes_disconnected() {
        let (_engine_end, module_end) = tokio::io::duplex(64);
        let mut session = StdioSession::spawn(module_end, BrokenPipe, IDLE);
        session.output("anyone there?").await;
        assert_eq!(session.next_event().await, Event::Disconnected);
    }
}
