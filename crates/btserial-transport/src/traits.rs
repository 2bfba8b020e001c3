use async_trait::async_trait;

use crate::error::{ConnectError, DiscoveryError};

/// A candidate peer produced by discovery.
///
/// The descriptor is consumed once to open a stream and is not retained
/// after the connection is established.
#[derive(Debug, Clone)]
pub struct PeerDescriptor<H> {
    /// Human-readable device name. The connection manager matches this
    /// case-insensitively against the requested peer name.
    pub display_name: String,
    /// Opaque connect handle, meaningful only to the transport that
    /// produced it.
    pub handle: H,
}

impl<H> PeerDescriptor<H> {
    /// Create a descriptor for a named peer.
    pub fn new(display_name: impl Into<String>, handle: H) -> Self {
        Self {
            display_name: display_name.into(),
            handle,
        }
    }
}

/// An open byte stream to a connected peer.
///
/// Reads are partial: a short read is normal and `Ok(0)` means no bytes
/// were available before the peer went away. Writes are all-or-error.
#[async_trait]
pub trait SerialStream: Send {
    /// Read up to `buf.len()` bytes, returning however many arrived.
    async fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Write the whole byte slice to the peer.
    async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Close the stream. Best-effort; errors are swallowed.
    async fn close(&mut self);
}

/// A discoverable transport that can open serial streams to named peers.
///
/// Implementations wrap a real radio (e.g. Bluetooth RFCOMM device
/// enumeration plus socket connect) or an in-process substitute such as
/// [`crate::MemoryTransport`].
#[async_trait]
pub trait SerialTransport: Send + Sync {
    /// Opaque connect handle carried inside [`PeerDescriptor`].
    type Handle: Send + 'static;
    /// The stream type produced by [`Self::open_stream`].
    type Stream: SerialStream + 'static;

    /// Enumerate all currently known candidate peers.
    async fn enumerate_candidates(
        &self,
    ) -> Result<Vec<PeerDescriptor<Self::Handle>>, DiscoveryError>;

    /// Resolve the peer's serial service and open a byte stream to it.
    async fn open_stream(&self, handle: Self::Handle) -> Result<Self::Stream, ConnectError>;
}
