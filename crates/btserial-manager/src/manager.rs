use bytes::Bytes;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};

use btserial_frame::Decoder;
use btserial_transport::{SerialStream, SerialTransport};

use crate::error::SetupError;
use crate::events::LinkEvent;
use crate::status::LinkStatus;

/// Configuration for a connection manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Frame decoder buffer capacity; bounds the largest acceptable
    /// length byte. Default: 255 (any well-formed frame fits).
    pub decoder_capacity: usize,
    /// Bytes requested per read operation. One `request_read` drains at
    /// most this much from the stream. Default: 100.
    pub read_chunk_size: usize,
    /// Event fan-out channel capacity. Default: 64.
    pub event_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            decoder_capacity: btserial_frame::DEFAULT_CAPACITY,
            read_chunk_size: 100,
            event_capacity: 64,
        }
    }
}

enum Command {
    Connect { peer_name: String },
    Reset,
    Send { bytes: Bytes },
    ReadRequest,
}

/// Handle to a connection manager.
///
/// Cloneable; all clones drive the same underlying task. Every operation
/// returns immediately and completes on the manager task, surfacing its
/// outcome through [`Manager::subscribe`] events. When the last handle is
/// dropped the task drains its queue and exits.
#[derive(Clone)]
pub struct Manager {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<LinkStatus>,
    events: broadcast::Sender<LinkEvent>,
}

impl Manager {
    /// Spawn a manager over the given transport with default
    /// configuration. Must be called from within a tokio runtime.
    pub fn spawn<T>(transport: T) -> Self
    where
        T: SerialTransport + 'static,
    {
        Self::spawn_with_config(transport, ManagerConfig::default())
    }

    /// Spawn a manager with explicit configuration.
    pub fn spawn_with_config<T>(transport: T, config: ManagerConfig) -> Self
    where
        T: SerialTransport + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(LinkStatus::Idle);
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        let task = ManagerTask {
            transport,
            stream: None,
            decoder: Decoder::new(config.decoder_capacity),
            status: LinkStatus::Idle,
            status_tx,
            events: event_tx.clone(),
            read_chunk_size: config.read_chunk_size,
        };
        tokio::spawn(task.run(command_rx));

        Self {
            commands: command_tx,
            status: status_rx,
            events: event_tx,
        }
    }

    /// Current connection status.
    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// Subscribe to status, diagnostic, inbound-message and
    /// send-completion events.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }

    /// Discover the named peer (case-insensitive) and connect to it.
    ///
    /// No-op with a diagnostic unless the current status is `Idle`.
    /// Resolution: first candidate whose display name matches wins.
    pub fn request_connection(&self, peer_name: impl Into<String>) {
        self.command(Command::Connect {
            peer_name: peer_name.into(),
        });
    }

    /// Return to `Idle` from any state, closing any open stream.
    pub fn reset(&self) {
        self.command(Command::Reset);
    }

    /// Write raw bytes to the connected peer.
    ///
    /// Silent no-op unless connected. The bytes go to the stream as-is;
    /// callers wanting framing encode with [`btserial_frame::encode`]
    /// first. Emits exactly one [`LinkEvent::SendComplete`] per accepted
    /// send, whether or not the write succeeds.
    pub fn send(&self, bytes: impl Into<Bytes>) {
        self.command(Command::Send {
            bytes: bytes.into(),
        });
    }

    /// Perform one partial read from the connected peer.
    ///
    /// Silent no-op unless connected. Drains at most one underlying read
    /// operation; call repeatedly to keep draining. Received bytes are
    /// fed through the frame decoder and every completed frame is
    /// delivered as [`LinkEvent::MessageReceived`].
    pub fn request_read(&self) {
        self.command(Command::ReadRequest);
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("manager task is gone, command dropped");
        }
    }
}

/// The single owner of status, stream and decoder. Commands are handled
/// strictly in submission order.
struct ManagerTask<T: SerialTransport> {
    transport: T,
    stream: Option<T::Stream>,
    decoder: Decoder,
    status: LinkStatus,
    status_tx: watch::Sender<LinkStatus>,
    events: broadcast::Sender<LinkEvent>,
    read_chunk_size: usize,
}

impl<T: SerialTransport> ManagerTask<T> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Connect { peer_name } => self.handle_connect(&peer_name).await,
                Command::Reset => self.handle_reset().await,
                Command::Send { bytes } => self.handle_send(&bytes).await,
                Command::ReadRequest => self.handle_read().await,
            }
        }
        debug!("all manager handles dropped, task exiting");
    }

    async fn handle_connect(&mut self, peer_name: &str) {
        if self.status != LinkStatus::Idle {
            self.diagnostic("serial interface already active");
            return;
        }

        self.diagnostic("getting connection");
        self.set_status(LinkStatus::Discovering);

        match self.setup(peer_name).await {
            Ok(()) => {
                // Re-affirm Connected so subscribers attached between the
                // transition and now still observe the final state.
                self.set_status(LinkStatus::Connected);
                self.diagnostic("got connection");
            }
            Err(err) => {
                self.diagnostic(err.to_string());
                self.set_status(LinkStatus::DiscoveryFailed);
            }
        }
    }

    async fn setup(&mut self, peer_name: &str) -> Result<(), SetupError> {
        let candidates = self.transport.enumerate_candidates().await?;
        if candidates.is_empty() {
            return Err(SetupError::NoDevices);
        }

        let matched = candidates
            .into_iter()
            .find(|candidate| candidate.display_name.eq_ignore_ascii_case(peer_name))
            .ok_or_else(|| SetupError::DeviceNotFound {
                name: peer_name.to_string(),
            })?;
        self.diagnostic(format!("got paired device: {}", matched.display_name));

        // Close any stream left over from an earlier connection.
        if let Some(mut stale) = self.stream.take() {
            stale.close().await;
        }

        let stream = self.transport.open_stream(matched.handle).await?;
        self.decoder.reset();
        self.stream = Some(stream);
        self.set_status(LinkStatus::Connected);
        Ok(())
    }

    async fn handle_reset(&mut self) {
        // Reset closes any open stream before returning to Idle.
        if let Some(mut stream) = self.stream.take() {
            stream.close().await;
        }
        self.set_status(LinkStatus::Idle);
    }

    async fn handle_send(&mut self, bytes: &[u8]) {
        if self.status != LinkStatus::Connected {
            debug!("send ignored, not connected");
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        if let Err(err) = stream.write_all(bytes).await {
            warn!(error = %err, "stream write failed");
            self.diagnostic("lost connection on write");
            self.set_status(LinkStatus::LostConnection);
        }
        self.emit(LinkEvent::SendComplete);
    }

    async fn handle_read(&mut self) {
        if self.status != LinkStatus::Connected {
            debug!("read ignored, not connected");
            return;
        }
        let mut chunk = vec![0u8; self.read_chunk_size];
        let result = match self.stream.as_mut() {
            Some(stream) => stream.read_some(&mut chunk).await,
            None => return,
        };

        match result {
            Ok(count) => {
                for &byte in &chunk[..count] {
                    if let Some(frame) = self.decoder.feed(byte) {
                        self.emit(LinkEvent::MessageReceived(frame));
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "stream read failed");
                self.diagnostic("lost connection on read");
                self.set_status(LinkStatus::LostConnection);
            }
        }
    }

    fn set_status(&mut self, status: LinkStatus) {
        self.status = status;
        // watch marks the value changed even on re-affirmation, which the
        // double Connected notification relies on.
        let _ = self.status_tx.send(status);
        self.emit(LinkEvent::StatusChanged(status));
    }

    fn diagnostic(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message);
        self.emit(LinkEvent::Diagnostic(message));
    }

    fn emit(&self, event: LinkEvent) {
        // Zero subscribers is fine; fan-out is best-effort.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.decoder_capacity, 255);
        assert_eq!(config.read_chunk_size, 100);
    }

    #[tokio::test]
    async fn manager_starts_idle() {
        let manager = Manager::spawn(btserial_transport::MemoryTransport::new());
        assert_eq!(manager.status(), LinkStatus::Idle);
    }
}
