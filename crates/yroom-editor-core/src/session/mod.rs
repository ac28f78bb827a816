//! Editor session lifecycle.
//!
//! A session owns one document, one provider connection and one mounted
//! view. It is created active and ends closed; closing releases all three,
//! and dropping a session closes it, so every exit path tears down.

mod prosemirror;
mod tiptap;

pub use prosemirror::ProseMirrorSession;
pub use tiptap::TipTapSession;

use smol_str::SmolStr;
use yrs::types::xml::XmlFragmentRef;

use crate::connection::ConnectionTarget;
use crate::doc::CollabDoc;
use crate::editor::{EditorView, KeyCombo, KeydownResult};
use crate::error::EditorError;
use crate::platform::{Connector, Page};
use crate::presence::UserPresence;
use crate::provider::ConnectionStatus;
use crate::settings::RoomSettings;
use crate::variant::EditorVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// Everything a session needs to open, derived from the room settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub target: ConnectionTarget,
    /// Credential for the Hocuspocus auth handshake.
    pub token: Option<SmolStr>,
    /// Cursor identity. TipTap sessions generate a random one when unset.
    pub user: Option<UserPresence>,
}

impl SessionConfig {
    pub fn from_settings(host: &str, settings: &RoomSettings) -> Self {
        Self {
            target: ConnectionTarget::for_settings(host, settings),
            token: settings.token.clone(),
            user: None,
        }
    }
}

/// Host services a session is opened against.
#[derive(Clone, Copy)]
pub struct SessionEnv<'a> {
    pub page: &'a dyn Page,
    pub connector: &'a dyn Connector,
}

/// Borrowed view of a live session's parts, for inspection and debugging.
pub struct SessionHandle<'a> {
    pub variant: EditorVariant,
    pub room: &'a str,
    pub doc: &'a CollabDoc,
    pub fragment: &'a XmlFragmentRef,
    pub view: &'a EditorView,
    pub status: ConnectionStatus,
    pub synced: bool,
}

/// One collaboration backend plus the editor bound to it.
pub trait CollaborativeEditorSession: Sized {
    fn open(config: SessionConfig, env: SessionEnv<'_>) -> Result<Self, EditorError>;

    /// Leave the room and unmount. Idempotent, and safe to reach again from
    /// a status listener while closing.
    fn close(&self);

    fn state(&self) -> SessionState;

    fn handle(&self) -> SessionHandle<'_>;

    /// Register a callback for provider status changes.
    fn on_status(&self, f: Box<dyn Fn(ConnectionStatus)>);

    /// Drive presence timing; see [`Provider::tick`](crate::provider::Provider::tick).
    fn tick(&self, now_ms: f64);
}

/// The session a room page runs, selected by its editor variant.
pub enum EditorSession {
    ProseMirror(ProseMirrorSession),
    TipTap(TipTapSession),
}

impl EditorSession {
    pub fn variant(&self) -> EditorVariant {
        match self {
            Self::ProseMirror(_) => EditorVariant::ProseMirror,
            Self::TipTap(_) => EditorVariant::TipTap,
        }
    }

    pub fn close(&self) {
        match self {
            Self::ProseMirror(s) => s.close(),
            Self::TipTap(s) => s.close(),
        }
    }

    pub fn state(&self) -> SessionState {
        match self {
            Self::ProseMirror(s) => s.state(),
            Self::TipTap(s) => s.state(),
        }
    }

    pub fn handle(&self) -> SessionHandle<'_> {
        match self {
            Self::ProseMirror(s) => s.handle(),
            Self::TipTap(s) => s.handle(),
        }
    }

    pub fn on_status(&self, f: impl Fn(ConnectionStatus) + 'static) {
        match self {
            Self::ProseMirror(s) => s.on_status(Box::new(f)),
            Self::TipTap(s) => s.on_status(Box::new(f)),
        }
    }

    /// Renew our presence and expire silent peers. Call every few seconds
    /// with a millisecond wall clock.
    pub fn tick(&self, now_ms: f64) {
        match self {
            Self::ProseMirror(s) => s.tick(now_ms),
            Self::TipTap(s) => s.tick(now_ms),
        }
    }

    fn active_view(&self) -> Result<&EditorView, EditorError> {
        if self.state() == SessionState::Closed {
            return Err(EditorError::Closed);
        }
        Ok(self.handle().view)
    }

    pub fn undo(&self) -> Result<bool, EditorError> {
        self.active_view()?.undo()
    }

    pub fn redo(&self) -> Result<bool, EditorError> {
        self.active_view()?.redo()
    }

    pub fn handle_key(&self, combo: &KeyCombo) -> Result<KeydownResult, EditorError> {
        self.active_view()?.handle_key(combo)
    }

    pub fn set_selection(&self, anchor: u32, head: u32) -> Result<(), EditorError> {
        self.active_view()?.set_selection(anchor, head);
        Ok(())
    }

    /// Serialized document content. Still available after closing.
    pub fn export_xml(&self) -> String {
        self.handle().view.export_xml()
    }
}
