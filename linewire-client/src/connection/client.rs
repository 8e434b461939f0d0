//! Connection to a remote line-oriented TCP peer

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};

use linewire_protocol::{CodecError, LineCodec};
use linewire_utils::{Error, Result};

use super::handler::{CallbackHandler, LineHandler};

/// Default bound on the TCP dial at construction
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default handoff queue depth: a strict handoff, so a stalled handler
/// throttles the read loop after at most one queued line
const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Grace period for background tasks to observe shutdown before they are
/// aborted
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Dialed; read/dispatch tasks not yet started
    Connected,
    /// Read and dispatch tasks running
    Listening,
    /// Torn down; a new connection must be built to reconnect
    Disconnected,
}

/// Why the read loop terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer closed the connection in an orderly fashion
    PeerClosed,
    /// Reading or decoding failed
    ReadError(String),
}

/// Configuration phase for a [`Connection`]
///
/// Handlers and tuning knobs are fixed here, before the connection exists.
/// Once `connect` returns there is no registration surface left, so the
/// dispatch loop can never race a mutating caller.
pub struct ConnectionBuilder {
    dial_timeout: Duration,
    queue_capacity: usize,
    handlers: Vec<Box<dyn LineHandler>>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self {
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            handlers: Vec::new(),
        }
    }

    /// Bound the TCP dial
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Depth of the read-to-dispatch handoff queue (minimum 1)
    ///
    /// The queue blocks when full: lines are never dropped, the read loop
    /// stalls instead.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Register a line handler; handlers run in registration order
    pub fn handler(mut self, handler: impl LineHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Register a closure as a line handler
    pub fn on_line<F>(self, callback: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.handler(CallbackHandler::new(callback))
    }

    /// Dial `host:port` and return the connection
    ///
    /// The port travels as text so service names composed upstream pass
    /// through unchanged.
    pub async fn connect(self, host: &str, port: &str) -> Result<Connection> {
        let addr = format!("{}:{}", host, port);

        let stream = match timeout(self.dial_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::error!("Failed to connect to {}: {}", addr, e);
                return Err(Error::Connection(format!(
                    "Failed to connect to {}: {}",
                    addr, e
                )));
            }
            Err(_) => {
                tracing::error!("Dial to {} timed out after {:?}", addr, self.dial_timeout);
                return Err(Error::DialTimeout {
                    addr,
                    timeout: self.dial_timeout,
                });
            }
        };

        let (read_half, write_half) = stream.into_split();

        let (shutdown_tx, _) = broadcast::channel(1);
        let (disconnect_tx, _) = broadcast::channel(1);

        Ok(Connection {
            host: host.to_string(),
            port: port.to_string(),
            addr,
            state: ConnectionState::Connected,
            writer: FramedWrite::new(write_half, LineCodec::new()),
            reader: Some(FramedRead::new(read_half, LineCodec::new())),
            handlers: self.handlers,
            queue_capacity: self.queue_capacity,
            shutdown_tx,
            disconnect_tx,
            read_handle: None,
            dispatch_handle: None,
        })
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client connection to a line-oriented TCP peer
pub struct Connection {
    /// Remote host as given at dial
    host: String,
    /// Remote port as given at dial
    port: String,
    /// Composed "host:port" dial address
    addr: String,
    /// Current state
    state: ConnectionState,
    /// Framed write half; every send flushes
    writer: FramedWrite<OwnedWriteHalf, LineCodec>,
    /// Framed read half, moved into the read task by `listen`
    reader: Option<FramedRead<OwnedReadHalf, LineCodec>>,
    /// Handlers waiting to be moved into the dispatch task
    handlers: Vec<Box<dyn LineHandler>>,
    queue_capacity: usize,
    /// Stop signal for the read task
    shutdown_tx: broadcast::Sender<()>,
    /// One-shot read-loop termination notice for external observers
    disconnect_tx: broadcast::Sender<DisconnectReason>,
    /// Handle to the read task
    read_handle: Option<JoinHandle<()>>,
    /// Handle to the dispatch task
    dispatch_handle: Option<JoinHandle<()>>,
}

impl Connection {
    /// Start configuring a connection
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// The composed "host:port" dial address
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Get current connection state
    ///
    /// Tracks lifecycle operations on this handle. Read-loop termination
    /// happens in the background; observe it via [`subscribe_disconnect`].
    ///
    /// [`subscribe_disconnect`]: Connection::subscribe_disconnect
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Write one line to the peer
    ///
    /// `line` must not contain a line terminator; CRLF is appended and the
    /// write is flushed before this returns. Exclusive access serializes
    /// concurrent writers at compile time. Write failures are returned to
    /// the caller and leave the read/dispatch tasks untouched.
    pub async fn write(&mut self, line: &str) -> Result<()> {
        self.writer.send(line).await.map_err(codec_error)
    }

    /// Start the read and dispatch tasks; returns immediately
    ///
    /// The sole transition from constructed to active. Calling it again
    /// returns [`Error::AlreadyListening`].
    pub fn listen(&mut self) -> Result<()> {
        let reader = self.reader.take().ok_or(Error::AlreadyListening)?;
        let handlers = std::mem::take(&mut self.handlers);

        let (line_tx, line_rx) = mpsc::channel(self.queue_capacity);

        self.read_handle = Some(tokio::spawn(read_task(
            reader,
            self.addr.clone(),
            line_tx,
            self.disconnect_tx.clone(),
            self.shutdown_tx.subscribe(),
        )));
        self.dispatch_handle = Some(tokio::spawn(dispatch_task(line_rx, handlers)));

        self.state = ConnectionState::Listening;
        Ok(())
    }

    /// Observe the read-loop termination notice
    ///
    /// The read loop sends exactly one [`DisconnectReason`] when it ends on
    /// a peer close or read failure; every receiver subscribed at that
    /// moment sees it. Nothing is sent on an explicit [`disconnect`].
    ///
    /// [`disconnect`]: Connection::disconnect
    pub fn subscribe_disconnect(&self) -> broadcast::Receiver<DisconnectReason> {
        self.disconnect_tx.subscribe()
    }

    /// Stop both background tasks and tear the connection down
    ///
    /// Signals shutdown, closes the write half, then waits a bounded grace
    /// period per task; a task wedged in a handler is aborted so this never
    /// hangs. Idempotent. No resurrection: reconnecting means building a
    /// new connection.
    pub async fn disconnect(&mut self) {
        let _ = self.shutdown_tx.send(());
        let _ = SinkExt::<&str>::close(&mut self.writer).await;
        self.reader = None;

        for handle in [self.read_handle.take(), self.dispatch_handle.take()] {
            let Some(mut handle) = handle else { continue };
            match timeout(DISCONNECT_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Background task failed: {}", e),
                Err(_) => {
                    tracing::warn!(
                        "Background task did not stop within {:?}, aborting",
                        DISCONNECT_GRACE
                    );
                    handle.abort();
                }
            }
        }

        self.state = ConnectionState::Disconnected;
    }
}

/// Map codec errors onto the shared error type, passing IO errors through
/// unmodified
fn codec_error(e: CodecError) -> Error {
    match e {
        CodecError::Io(e) => Error::Io(e),
        other => Error::protocol(other.to_string()),
    }
}

/// Read loop: frame inbound bytes into lines and hand each one off
///
/// The handoff send blocks while the queue is full, so dispatch throughput
/// gates read throughput and no line is ever dropped. Exiting for any
/// reason drops `line_tx`, which closes the channel and lets the dispatch
/// loop drain and stop; the read half of the transport is dropped with the
/// task.
async fn read_task(
    mut reader: FramedRead<OwnedReadHalf, LineCodec>,
    addr: String,
    line_tx: mpsc::Sender<String>,
    disconnect_tx: broadcast::Sender<DisconnectReason>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = reader.next() => {
                match result {
                    Some(Ok(line)) => {
                        if line_tx.send(line).await.is_err() {
                            tracing::debug!("Line channel closed, dispatch loop gone");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("Failed to read from {}: {}", addr, e);
                        let _ = disconnect_tx.send(DisconnectReason::ReadError(e.to_string()));
                        break;
                    }
                    None => {
                        tracing::info!("Peer {} closed connection", addr);
                        let _ = disconnect_tx.send(DisconnectReason::PeerClosed);
                        break;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("Shutdown signal received, stopping read loop");
                break;
            }
        }
    }
}

/// Dispatch loop: fan each received line out to every handler, in
/// registration order, synchronously
///
/// Handlers are not isolated from one another: a handler that blocks
/// stalls the loop, one that panics kills it. Terminates once the line
/// channel is closed and drained, then tells each handler the stream
/// ended.
async fn dispatch_task(mut line_rx: mpsc::Receiver<String>, mut handlers: Vec<Box<dyn LineHandler>>) {
    while let Some(line) = line_rx.recv().await {
        for handler in handlers.iter_mut() {
            handler.on_line(&line);
        }
    }

    for handler in handlers.iter_mut() {
        handler.on_disconnect();
    }
    tracing::debug!("Line channel closed, dispatch loop stopped");
}
