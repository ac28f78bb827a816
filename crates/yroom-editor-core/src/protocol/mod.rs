//! Binary framing for the two collaboration protocols.
//!
//! Both carry the same y-protocols sync and awareness payloads; they differ
//! in how a frame addresses its document. CRDT state itself is opaque here
//! and handed to `yrs` unchanged.

pub mod hocuspocus;
pub mod sync;

pub use hocuspocus::{AuthMessage, HocusFrame, HocusMessage};
pub use sync::{Message, SyncMessage};
