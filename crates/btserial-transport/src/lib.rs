//! Peer discovery and serial stream abstraction.
//!
//! Provides the collaborator interface the connection manager is built
//! against: enumerate nearby peers, open a byte stream to one of them,
//! read and write on that stream. Real radios (Bluetooth RFCOMM and the
//! like) live behind [`SerialTransport`]; this crate ships an in-memory
//! implementation for in-process use and testing.
//!
//! This is the lowest layer of btserial. Everything else builds on top of
//! the [`SerialStream`] type provided here.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ConnectError, DiscoveryError};
pub use memory::{MemoryTransport, RemoteDevice};
pub use traits::{PeerDescriptor, SerialStream, SerialTransport};
