//! Error types for editor bootstrap and collaboration sessions.

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::platform::PlatformError;

/// Main error type for bootstrapping and driving an editor session.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorError {
    /// The page-supplied settings could not be read. Fatal to startup.
    #[error(transparent)]
    #[diagnostic_source]
    Configuration(#[from] ConfigurationError),

    /// The `editor` field named an integration we do not ship.
    #[error("unsupported editor variant `{0}`")]
    #[diagnostic(
        code(yroom::variant),
        help("expected one of: prosemirror, tiptap")
    )]
    UnsupportedVariant(SmolStr),

    /// The element an editor should mount into does not exist.
    #[error("mount point `{0}` not found")]
    #[diagnostic(code(yroom::mount))]
    MissingMount(SmolStr),

    /// The extension or plugin set cannot be assembled.
    #[error("invalid editor setup: {0}")]
    #[diagnostic(code(yroom::setup))]
    InvalidSetup(SmolStr),

    /// DOM or host platform failure.
    #[error(transparent)]
    #[diagnostic_source]
    Platform(#[from] PlatformError),

    /// The connection could not be opened or written to.
    #[error(transparent)]
    #[diagnostic_source]
    Transport(#[from] TransportError),

    /// A frame could not be decoded or applied.
    #[error(transparent)]
    #[diagnostic_source]
    Protocol(#[from] ProtocolError),

    /// The CRDT document refused an observer or transaction.
    #[error("document unavailable: {0}")]
    #[diagnostic(code(yroom::doc))]
    Document(String),

    /// The CRDT undo manager could not acquire a transaction.
    #[error("undo failed: {0}")]
    Undo(String),

    /// Operation attempted on a session that was already closed.
    #[error("session is closed")]
    Closed,
}

/// Missing or malformed settings payload.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("settings element `#{0}` not found")]
    #[diagnostic(
        code(yroom::settings::missing),
        help("render the room settings with json_script into the page")
    )]
    MissingElement(SmolStr),

    #[error("settings payload is not valid JSON")]
    #[diagnostic(code(yroom::settings::json))]
    Malformed(#[source] serde_json::Error),

    #[error("settings payload has no room name")]
    #[diagnostic(code(yroom::settings::room))]
    MissingRoomName,
}

/// Wire-level decoding failures.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
#[diagnostic(code(yroom::protocol))]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Decode(String),

    #[error("unknown message type {0}")]
    UnknownMessage(u64),

    #[error("invalid CRDT update: {0}")]
    Update(String),

    #[error("invalid awareness state")]
    Awareness(#[source] serde_json::Error),
}

impl From<yrs::encoding::read::Error> for ProtocolError {
    fn from(e: yrs::encoding::read::Error) -> Self {
        ProtocolError::Decode(e.to_string())
    }
}

/// Connection failures reported by a platform connector.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
#[diagnostic(code(yroom::transport))]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to send frame: {0}")]
    Send(String),

    #[error("connection is not open")]
    NotOpen,
}
