//! Browser layer for yroom collaborative editors.
//!
//! This crate implements the platform traits of `yroom-editor-core` on top of
//! the DOM and the browser `WebSocket`. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `page`: settings lookup, container creation and rendering into elements
//! - `socket`: binary `WebSocket` connections for the providers
//! - `heartbeat`: the timer that drives presence renewal and expiry
//! - `keys`: keydown translation and listener wiring
//! - `platform`: Browser/OS detection for key bindings
//! - `unload`: session teardown when the page goes away
//!
//! # Re-exports
//!
//! This crate re-exports `yroom-editor-core` for convenience, so consumers
//! only need to depend on `yroom-editor-browser`.

// Re-export core crate
pub use yroom_editor_core;
pub use yroom_editor_core::*;

pub mod heartbeat;
pub mod keys;
pub mod page;
pub mod platform;
pub mod socket;
pub mod unload;

pub use heartbeat::{HEARTBEAT_MS, start_heartbeat};
pub use keys::{key_combo, listen_keydown};
pub use page::{BrowserPage, ElementMount};
pub use platform::{Platform, platform};
pub use socket::{BrowserConnector, WebSocketTransport};
pub use unload::close_on_pagehide;

use wasm_bindgen::JsValue;

/// Best-effort message for a thrown JS value.
pub(crate) fn js_message(value: JsValue) -> String {
    match gloo_utils::errors::JsError::try_from(value) {
        Ok(err) => err.to_string(),
        Err(not_error) => not_error.to_string(),
    }
}
