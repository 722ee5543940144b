pub mod protocol;

pub use protocol::{decode_line, TelemetryEnvelope, TelemetryReading};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Factory-default address of the meter's access point.
pub const DEFAULT_HOST: &str = "192.168.4.1";
pub const DEFAULT_PORT: u16 = 80;

/// Pause between reads so a chatty device does not turn into a busy loop.
const READ_PACING: Duration = Duration::from_secs(1);
const EVENT_BUFFER: usize = 64;

/// Connection lifecycle of one link. Exactly one state is active at a
/// time; every transition is delivered to the consumer as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl ConnectionState {
    /// Boolean connected/disconnected signal for display purposes.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// What the link hands its consumer: decoded readings in wire order,
/// interleaved with state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Reading(TelemetryReading),
    Status(ConnectionState),
}

/// One TCP connection to one meter. The link is bound to a single
/// host/port for its lifetime; talking to a different device means
/// constructing a new link.
///
/// `connect()` never blocks: the dial and the read loop run on a spawned
/// task, and everything the consumer sees crosses the bounded event
/// channel returned by [`TelemetryLink::new`]. There is no automatic
/// reconnect; after a `Status` with `is_connected() == false` the caller
/// decides whether to call `connect()` again.
pub struct TelemetryLink {
    host: String,
    port: u16,
    events: mpsc::Sender<LinkEvent>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl TelemetryLink {
    pub fn new(host: impl Into<String>, port: u16) -> (Self, mpsc::Receiver<LinkEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let link = Self {
            host: host.into(),
            port,
            events: tx,
            connected: Arc::new(AtomicBool::new(false)),
            task: None,
        };
        (link, rx)
    }

    /// Link to the meter's factory-default access point.
    pub fn with_defaults() -> (Self, mpsc::Receiver<LinkEvent>) {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Start the connection attempt and, on success, the read loop.
    /// Returns immediately; the outcome arrives as `Status` events.
    /// A no-op while a previous attempt is still running.
    pub fn connect(&mut self) {
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let host = self.host.clone();
        let port = self.port;
        let events = self.events.clone();
        let connected = Arc::clone(&self.connected);
        self.task = Some(tokio::spawn(run_link(host, port, events, connected)));
    }

    /// Tear the connection down: abort the background task, drop the
    /// socket, notify the consumer. Safe to call repeatedly; calls after
    /// the first are no-ops and emit nothing.
    pub fn disconnect(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        self.connected.store(false, Ordering::SeqCst);
        let _ = self
            .events
            .try_send(LinkEvent::Status(ConnectionState::Disconnected));
    }
}

impl Drop for TelemetryLink {
    fn drop(&mut self) {
        // Aborting the task drops the socket with it.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_link(
    host: String,
    port: u16,
    events: mpsc::Sender<LinkEvent>,
    connected: Arc<AtomicBool>,
) {
    let _ = events
        .send(LinkEvent::Status(ConnectionState::Connecting))
        .await;

    let stream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(host = %host, port, error = %e, "connection failed");
            let _ = events
                .send(LinkEvent::Status(ConnectionState::Failed(e.to_string())))
                .await;
            return;
        }
    };

    connected.store(true, Ordering::SeqCst);
    info!(host = %host, port, "connected to meter");
    let _ = events
        .send(LinkEvent::Status(ConnectionState::Connected))
        .await;

    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match decode_line(&line) {
                    Ok(Some(reading)) => {
                        // Consumer gone means nobody is listening; stop.
                        if events.send(LinkEvent::Reading(reading)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        // Sensor error, already logged by the decoder.
                    }
                    Err(e) => {
                        warn!(error = %e, line = %line, "skipping malformed telemetry line");
                    }
                }
                sleep(READ_PACING).await;
            }
            Ok(None) => {
                info!(host = %host, "device closed the connection");
                break;
            }
            Err(e) => {
                warn!(host = %host, error = %e, "stream read failed");
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    let _ = events
        .send(LinkEvent::Status(ConnectionState::Disconnected))
        .await;
}
