//! Platform abstraction traits for page access and network connections.
//!
//! These traits define the interface between the bootstrap logic and the
//! host environment. The browser implementation lives in
//! `yroom-editor-browser` and uses the DOM and `WebSocket`; tests implement
//! them in memory. Everything here is single-threaded: handles are shared
//! with `Rc` and callbacks are invoked on the page's event loop.

use std::rc::Rc;

use miette::Diagnostic;

use crate::connection::ConnectionTarget;
use crate::error::TransportError;

/// Error type for platform operations.
#[derive(Debug, Clone, thiserror::Error, Diagnostic)]
#[error("{0}")]
#[diagnostic(code(yroom::platform))]
pub struct PlatformError(pub String);

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Read access to the hosting page plus the ability to create mount points.
pub trait Page {
    /// Host (and port, if any) of the current page, e.g. `example.com:8000`.
    fn host(&self) -> String;

    /// Text content of the element with the given id, if present.
    fn text_content(&self, element_id: &str) -> Option<String>;

    /// Create a fresh container appended to the document body and return the
    /// mount for an editor element with `editor_id` and `class` inside it.
    fn append_container(
        &self,
        editor_id: &str,
        class: &str,
    ) -> Result<Rc<dyn Mount>, PlatformError>;

    /// Look up an existing element to mount into.
    fn query_mount(&self, selector: &str) -> Option<Rc<dyn Mount>>;

    /// Whether `Mod` key bindings should resolve to Cmd instead of Ctrl.
    fn is_mac(&self) -> bool {
        false
    }
}

/// An element an editor view renders into.
pub trait Mount {
    /// DOM id of the element, used in logs.
    fn element_id(&self) -> String;

    /// Replace the element content with the serialized fragment.
    fn render_xml(&self, xml: &str);

    /// Detach from the page. Mounts created by `Page::append_container`
    /// remove their container; caller-supplied mounts are only emptied.
    fn remove(&self);
}

/// Outbound half of an open connection.
pub trait Transport {
    /// Send one binary frame.
    fn send(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Close the connection. Must be safe to call more than once.
    fn close(&self);
}

/// Inbound callbacks a platform connection reports to its provider.
pub trait ConnectionEvents {
    fn on_open(&self);

    fn on_frame(&self, frame: &[u8]);

    fn on_close(&self, reason: Option<&str>);
}

/// Opens connections to a collaboration endpoint.
///
/// Connecting is fire-and-forget: the returned transport may not be open
/// yet, and the platform reports `on_open` once it is.
pub trait Connector {
    fn connect(
        &self,
        target: &ConnectionTarget,
        events: Rc<dyn ConnectionEvents>,
    ) -> Result<Rc<dyn Transport>, TransportError>;
}
