use btserial_transport::{ConnectError, DiscoveryError};

/// Failure modes of connection setup.
///
/// Never crosses the public API: rendered into a diagnostic string and a
/// `DiscoveryFailed` status transition.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SetupError {
    /// Enumerating candidate peers failed.
    #[error("finding paired devices failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Enumeration succeeded but returned no candidates.
    #[error("no devices found")]
    NoDevices,

    /// No candidate's name matched the requested peer.
    #[error("device not found: {name}")]
    DeviceNotFound { name: String },

    /// Service resolution or socket establishment failed.
    #[error("failed to open connection: {0}")]
    Connect(#[from] ConnectError),
}
