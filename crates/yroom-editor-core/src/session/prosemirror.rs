use std::cell::Cell;
use std::rc::Rc;

use smol_str::SmolStr;
use yrs::types::xml::XmlFragmentRef;

use super::{CollaborativeEditorSession, SessionConfig, SessionEnv, SessionHandle, SessionState};
use crate::doc::CollabDoc;
use crate::editor::EditorView;
use crate::editor::prosemirror::{
    EDITOR_CLASS, EDITOR_ELEMENT_ID, PROSEMIRROR_FRAGMENT, build_view, collab_plugins,
};
use crate::error::EditorError;
use crate::provider::{ConnectionStatus, Provider, WebsocketProvider, YWebsocketFraming};
use crate::variant::EditorVariant;

/// ProseMirror view synced over y-websocket.
///
/// Mounts into a container it creates and removes again on close.
pub struct ProseMirrorSession {
    room: SmolStr,
    doc: CollabDoc,
    fragment: XmlFragmentRef,
    provider: WebsocketProvider,
    view: EditorView,
    state: Cell<SessionState>,
}

impl ProseMirrorSession {
    pub fn provider(&self) -> &WebsocketProvider {
        &self.provider
    }

    pub fn view(&self) -> &EditorView {
        &self.view
    }
}

impl CollaborativeEditorSession for ProseMirrorSession {
    fn open(config: SessionConfig, env: SessionEnv<'_>) -> Result<Self, EditorError> {
        let doc = CollabDoc::new();
        let provider = Provider::connect(
            env.connector,
            &config.target,
            doc.clone(),
            YWebsocketFraming,
        )?;
        let fragment = doc.fragment(PROSEMIRROR_FRAGMENT);

        let view = env
            .page
            .append_container(EDITOR_ELEMENT_ID, EDITOR_CLASS)
            .map_err(EditorError::from)
            .and_then(|mount| {
                build_view(
                    &doc,
                    Rc::new(provider.clone()),
                    config.user.clone(),
                    mount,
                    collab_plugins(env.page.is_mac()),
                )
            });
        let view = match view {
            Ok(view) => view,
            Err(e) => {
                provider.disconnect();
                return Err(e);
            }
        };

        tracing::debug!(room = %config.target.room, "prosemirror session open");
        Ok(Self {
            room: config.target.room,
            doc,
            fragment,
            provider,
            view,
            state: Cell::new(SessionState::Active),
        })
    }

    fn close(&self) {
        // marked first so status listeners that run during teardown see it
        if self.state.replace(SessionState::Closed) == SessionState::Closed {
            return;
        }
        self.provider.disconnect();
        self.view.unmount();
        tracing::debug!(room = %self.room, "prosemirror session closed");
    }

    fn state(&self) -> SessionState {
        self.state.get()
    }

    fn handle(&self) -> SessionHandle<'_> {
        SessionHandle {
            variant: EditorVariant::ProseMirror,
            room: &self.room,
            doc: &self.doc,
            fragment: &self.fragment,
            view: &self.view,
            status: self.provider.status(),
            synced: self.provider.is_synced(),
        }
    }

    fn on_status(&self, f: Box<dyn Fn(ConnectionStatus)>) {
        self.provider.on_status(f);
    }

    fn tick(&self, now_ms: f64) {
        self.provider.tick(now_ms);
    }
}

impl Drop for ProseMirrorSession {
    fn drop(&mut self) {
        self.close();
    }
}
