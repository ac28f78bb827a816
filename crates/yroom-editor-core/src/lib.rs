//! yroom-editor-core: platform-agnostic bootstrap for collaborative room
//! editors.
//!
//! This crate provides:
//! - `RoomSettings` - the page-embedded room configuration
//! - `ConnectionTarget` - socket URL derivation per editor variant
//! - `CollabDoc`, `Awareness` - the shared CRDT document (via `yrs`) and presence
//! - `WebsocketProvider`, `HocuspocusProvider` - sync over the two wire protocols
//! - `EditorView` plus the ProseMirror and TipTap compositions
//! - `EditorSession` - the create, active, closed lifecycle and `bootstrap::start`
//!
//! DOM and socket access go through the traits in [`platform`]; the browser
//! implementation lives in `yroom-editor-browser`.

pub mod awareness;
pub mod bootstrap;
pub mod connection;
pub mod doc;
pub mod editor;
pub mod error;
pub mod platform;
pub mod presence;
pub mod protocol;
pub mod provider;
pub mod session;
pub mod settings;
pub mod variant;

pub use awareness::{
    Awareness, AwarenessChange, ClientId, OUTDATED_TIMEOUT_MS, RENEW_INTERVAL_MS,
};
pub use bootstrap::{open_session, start};
pub use connection::{ConnectionTarget, Scheme, WireProtocol, build_url};
pub use doc::CollabDoc;
pub use editor::{EditorView, Key, KeyCombo, KeydownResult, Modifiers, RemoteCursor};
pub use error::{ConfigurationError, EditorError, ProtocolError, TransportError};
pub use platform::{ConnectionEvents, Connector, Mount, Page, PlatformError, Transport};
pub use presence::UserPresence;
pub use provider::{ConnectionStatus, HocuspocusProvider, WebsocketProvider};
pub use session::{
    CollaborativeEditorSession, EditorSession, SessionConfig, SessionEnv, SessionHandle,
    SessionState,
};
pub use settings::{RoomSettings, SETTINGS_ELEMENT_ID, read_settings};
pub use smol_str::SmolStr;
pub use variant::EditorVariant;
