use bytes::Bytes;

use crate::status::LinkStatus;

/// Notifications fanned out to manager subscribers.
///
/// Delivered off the caller's stack through a broadcast channel; a
/// subscriber that falls behind loses the oldest events, never the
/// ordering of the ones it does see.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The connection status changed. A successful setup emits
    /// `Connected` twice (transition plus re-affirmation) so subscribers
    /// attached between the two still observe the final state.
    StatusChanged(LinkStatus),

    /// Human-readable progress or failure detail.
    Diagnostic(String),

    /// A complete, checksum-validated frame arrived. The last byte is
    /// the frame's checksum; strip it to get the application payload.
    MessageReceived(Bytes),

    /// A send request finished, successfully or not. Emitted exactly
    /// once per send accepted while connected.
    SendComplete,
}
