/// Errors that can occur while enumerating candidate peers.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Enumerating nearby/paired devices failed.
    #[error("device enumeration failed: {message}")]
    Enumeration { message: String },
}

/// Errors that can occur while opening a stream to a discovered peer.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The peer's serial service could not be resolved.
    #[error("service resolution failed: {message}")]
    ServiceResolution { message: String },

    /// Socket establishment to the resolved service failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}
