use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tracing::debug;

use crate::error::{ConnectError, DiscoveryError};
use crate::traits::{PeerDescriptor, SerialStream, SerialTransport};

/// Buffered capacity of each in-memory link, per direction.
const LINK_CAPACITY: usize = 4096;

/// Per-stream fault switches, shared between the local stream and the
/// remote test handle.
#[derive(Debug, Default)]
struct Faults {
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

struct Device {
    name: String,
    /// Local end of the link, handed out once by `open_stream`.
    local: Option<DuplexStream>,
    faults: Arc<Faults>,
}

#[derive(Default)]
struct State {
    devices: Vec<Device>,
}

/// In-memory serial transport.
///
/// Devices are registered with [`MemoryTransport::add_device`], which
/// returns the remote end of the link so the peer side can be driven
/// in-process. Discovery and connect failures can be injected to exercise
/// the manager's failure paths without a radio.
pub struct MemoryTransport {
    state: Mutex<State>,
    enumeration_fails: AtomicBool,
    connect_fails: AtomicBool,
}

impl MemoryTransport {
    /// Create an empty transport with no discoverable devices.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            enumeration_fails: AtomicBool::new(false),
            connect_fails: AtomicBool::new(false),
        }
    }

    /// Register a discoverable device and return the remote end of its
    /// link. The device appears in subsequent enumerations; the first
    /// `open_stream` against it consumes the local end.
    pub fn add_device(&self, name: impl Into<String>) -> RemoteDevice {
        let (local, remote) = duplex(LINK_CAPACITY);
        let faults = Arc::new(Faults::default());
        let mut state = self.state.lock().expect("memory transport state poisoned");
        state.devices.push(Device {
            name: name.into(),
            local: Some(local),
            faults: Arc::clone(&faults),
        });
        RemoteDevice { io: remote, faults }
    }

    /// Make every subsequent enumeration fail.
    pub fn set_enumeration_failure(&self, fail: bool) {
        self.enumeration_fails.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `open_stream` fail during service resolution.
    pub fn set_connect_failure(&self, fail: bool) {
        self.connect_fails.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SerialTransport for MemoryTransport {
    type Handle = usize;
    type Stream = MemoryStream;

    async fn enumerate_candidates(
        &self,
    ) -> Result<Vec<PeerDescriptor<Self::Handle>>, DiscoveryError> {
        if self.enumeration_fails.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Enumeration {
                message: "radio unavailable".to_string(),
            });
        }
        let state = self.state.lock().expect("memory transport state poisoned");
        let candidates = state
            .devices
            .iter()
            .enumerate()
            .map(|(index, device)| PeerDescriptor::new(device.name.clone(), index))
            .collect();
        Ok(candidates)
    }

    async fn open_stream(&self, handle: Self::Handle) -> Result<Self::Stream, ConnectError> {
        if self.connect_fails.load(Ordering::SeqCst) {
            return Err(ConnectError::ServiceResolution {
                message: "service resolution refused".to_string(),
            });
        }
        let mut state = self.state.lock().expect("memory transport state poisoned");
        let device = state
            .devices
            .get_mut(handle)
            .ok_or_else(|| ConnectError::ServiceResolution {
                message: format!("unknown device handle {handle}"),
            })?;
        let local = device.local.take().ok_or_else(|| ConnectError::ServiceResolution {
            message: format!("service on \"{}\" already in use", device.name),
        })?;
        debug!(device = %device.name, "opened in-memory stream");
        Ok(MemoryStream {
            io: local,
            faults: Arc::clone(&device.faults),
        })
    }
}

/// Local end of an in-memory link, as handed to the connection manager.
#[derive(Debug)]
pub struct MemoryStream {
    io: DuplexStream,
    faults: Arc<Faults>,
}

#[async_trait]
impl SerialStream for MemoryStream {
    async fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::ConnectionReset, "injected read failure"));
        }
        self.io.read(buf).await
    }

    async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::BrokenPipe, "injected write failure"));
        }
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }

    async fn close(&mut self) {
        let _ = self.io.shutdown().await;
    }
}

/// Remote end of an in-memory link: the "device" side.
///
/// Dropping it makes subsequent manager-side reads return `Ok(0)` and
/// writes fail with `BrokenPipe`.
pub struct RemoteDevice {
    io: DuplexStream,
    faults: Arc<Faults>,
}

impl RemoteDevice {
    /// Queue bytes for the manager side to read.
    pub async fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }

    /// Read bytes the manager side has written.
    pub async fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.io.read(buf).await
    }

    /// Make manager-side reads fail from now on.
    pub fn fail_reads(&self) {
        self.faults.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Make manager-side writes fail from now on.
    pub fn fail_writes(&self) {
        self.faults.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enumerate_lists_registered_devices() {
        let transport = MemoryTransport::new();
        let _printer = transport.add_device("PRINTER");
        let _scale = transport.add_device("SCALE");

        let candidates = transport.enumerate_candidates().await.unwrap();
        let names: Vec<_> = candidates
            .iter()
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(names, ["PRINTER", "SCALE"]);
    }

    #[tokio::test]
    async fn enumeration_failure_injection() {
        let transport = MemoryTransport::new();
        transport.set_enumeration_failure(true);
        let err = transport.enumerate_candidates().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Enumeration { .. }));
    }

    #[tokio::test]
    async fn roundtrip_over_link() {
        let transport = MemoryTransport::new();
        let mut remote = transport.add_device("PRINTER");

        let mut stream = transport.open_stream(0).await.unwrap();
        stream.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 16];
        let n = remote.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");

        remote.send(b"pong").await.unwrap();
        let n = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn open_stream_consumes_the_link() {
        let transport = MemoryTransport::new();
        let _remote = transport.add_device("PRINTER");

        let _stream = transport.open_stream(0).await.unwrap();
        let err = transport.open_stream(0).await.unwrap_err();
        assert!(matches!(err, ConnectError::ServiceResolution { .. }));
    }

    #[tokio::test]
    async fn unknown_handle_is_a_resolution_error() {
        let transport = MemoryTransport::new();
        let err = transport.open_stream(7).await.unwrap_err();
        assert!(matches!(err, ConnectError::ServiceResolution { .. }));
    }

    #[tokio::test]
    async fn injected_write_failure() {
        let transport = MemoryTransport::new();
        let remote = transport.add_device("PRINTER");

        let mut stream = transport.open_stream(0).await.unwrap();
        remote.fail_writes();
        let err = stream.write_all(b"x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn injected_read_failure() {
        let transport = MemoryTransport::new();
        let remote = transport.add_device("PRINTER");

        let mut stream = transport.open_stream(0).await.unwrap();
        remote.fail_reads();
        let mut buf = [0u8; 4];
        let err = stream.read_some(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn dropped_remote_reads_eof() {
        let transport = MemoryTransport::new();
        let remote = transport.add_device("PRINTER");

        let mut stream = transport.open_stream(0).await.unwrap();
        drop(remote);
        let mut buf = [0u8; 4];
        let n = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }
}
