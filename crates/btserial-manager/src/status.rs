/// Connection lifecycle states.
///
/// Transitions: `Idle → Discovering → {Connected | DiscoveryFailed}`,
/// `Connected → LostConnection`, and any state back to `Idle` via
/// [`crate::Manager::reset`]. There is no automatic recovery: after
/// `DiscoveryFailed` or `LostConnection` the caller must reset and issue
/// a new connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No connection and no discovery in progress.
    Idle,
    /// Discovery and connection setup are running.
    Discovering,
    /// A stream to the peer is open and usable.
    Connected,
    /// Discovery or connection setup failed.
    DiscoveryFailed,
    /// An established connection failed on read or write.
    LostConnection,
}

impl LinkStatus {
    /// Human-readable status name.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Idle => "idle",
            LinkStatus::Discovering => "discovering",
            LinkStatus::Connected => "connected",
            LinkStatus::DiscoveryFailed => "discovery failed",
            LinkStatus::LostConnection => "lost connection",
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
