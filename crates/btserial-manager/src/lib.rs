//! Connection lifecycle management for framed serial links.
//!
//! This is the "just works" layer. A [`Manager`] discovers a named peer,
//! opens a serial stream to it, and exchanges bytes over it; every
//! operation is fire-and-forget and surfaces its outcome through the
//! event subscription, never through return values.
//!
//! All mutable state (status, stream, frame decoder) is owned by a single
//! task; manager handles only enqueue commands, so operations are
//! serialized in submission order and no locking is needed.

mod error;
pub mod events;
pub mod manager;
pub mod status;

pub use events::LinkEvent;
pub use manager::{Manager, ManagerConfig};
pub use status::LinkStatus;
