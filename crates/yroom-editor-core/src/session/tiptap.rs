use std::cell::Cell;
use std::rc::Rc;

use smol_str::SmolStr;
use yrs::types::xml::XmlFragmentRef;

use super::{CollaborativeEditorSession, SessionConfig, SessionEnv, SessionHandle, SessionState};
use crate::doc::CollabDoc;
use crate::editor::tiptap::{Editor, MOUNT_SELECTOR, TIPTAP_FIELD, collab_extensions};
use crate::error::EditorError;
use crate::presence::UserPresence;
use crate::provider::{ConnectionStatus, HocuspocusFraming, HocuspocusProvider, Provider};
use crate::variant::EditorVariant;

/// TipTap editor synced over Hocuspocus.
///
/// Mounts into the element the page provides; closing empties it but leaves
/// the element in place.
pub struct TipTapSession {
    room: SmolStr,
    doc: CollabDoc,
    fragment: XmlFragmentRef,
    provider: HocuspocusProvider,
    editor: Editor,
    user: UserPresence,
    state: Cell<SessionState>,
}

impl TipTapSession {
    pub fn provider(&self) -> &HocuspocusProvider {
        &self.provider
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Identity shown on this participant's cursor.
    pub fn user(&self) -> &UserPresence {
        &self.user
    }
}

impl CollaborativeEditorSession for TipTapSession {
    fn open(config: SessionConfig, env: SessionEnv<'_>) -> Result<Self, EditorError> {
        // checked before connecting so a broken page opens nothing
        let element = env
            .page
            .query_mount(MOUNT_SELECTOR)
            .ok_or_else(|| EditorError::MissingMount(SmolStr::new_static(MOUNT_SELECTOR)))?;

        let room = config.target.room.clone();
        let doc = CollabDoc::new();
        let framing = HocuspocusFraming::new(room.clone(), config.token);
        let provider = Provider::connect(env.connector, &config.target, doc.clone(), framing)?;
        let fragment = doc.fragment(TIPTAP_FIELD);

        let user = config.user.unwrap_or_else(UserPresence::random);
        let editor = match Editor::new(
            &doc,
            Rc::new(provider.clone()),
            element,
            collab_extensions(user.clone()),
            env.page.is_mac(),
        ) {
            Ok(editor) => editor,
            Err(e) => {
                provider.disconnect();
                return Err(e);
            }
        };

        tracing::debug!(room = %room, user = %user.name, "tiptap session open");
        Ok(Self {
            room,
            doc,
            fragment,
            provider,
            editor,
            user,
            state: Cell::new(SessionState::Active),
        })
    }

    fn close(&self) {
        // marked first so status listeners that run during teardown see it
        if self.state.replace(SessionState::Closed) == SessionState::Closed {
            return;
        }
        self.provider.disconnect();
        self.editor.destroy();
        tracing::debug!(room = %self.room, "tiptap session closed");
    }

    fn state(&self) -> SessionState {
        self.state.get()
    }

    fn handle(&self) -> SessionHandle<'_> {
        SessionHandle {
            variant: EditorVariant::TipTap,
            room: &self.room,
            doc: &self.doc,
            fragment: &self.fragment,
            view: self.editor.view(),
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

impl Drop for TipTapSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::view::testing::RecordingMount;
    use crate::protocol::{AuthMessage, HocusFrame, HocusMessage};
    use crate::provider::testing::LoopbackConnector;
    use crate::session::testing::FakePage;
    use crate::settings::RoomSettings;

    fn config() -> SessionConfig {
        let settings = RoomSettings::new(EditorVariant::TipTap, "room1", "/ws/tiptap/");
        SessionConfig::from_settings("example.com", &settings)
    }

    fn page() -> FakePage {
        FakePage {
            container: Some(Rc::new(RecordingMount::new("editor-container"))),
            ..Default::default()
        }
    }

    #[test]
    fn test_binds_to_supplied_element() {
        let page = page();
        let connector = LoopbackConnector::default();
        let session = TipTapSession::open(
            config(),
            SessionEnv {
                page: &page,
                connector: &connector,
            },
        )
        .unwrap();

        assert_eq!(session.handle().view.element_id(), "editor-container");
        assert!(page.appended.borrow().is_empty());
        assert!(!session.editor().has_native_history());
        assert_eq!(connector.targets.borrow()[0].url, "ws://example.com/ws/tiptap/room1");
    }

    #[test]
    fn test_missing_element_opens_no_connection() {
        let page = FakePage::default();
        let connector = LoopbackConnector::default();
        let result = TipTapSession::open(
            config(),
            SessionEnv {
                page: &page,
                connector: &connector,
            },
        );
        assert!(matches!(result, Err(EditorError::MissingMount(_))));
        assert!(connector.targets.borrow().is_empty());
    }

    #[test]
    fn test_open_sends_token_for_room() {
        let page = page();
        let connector = LoopbackConnector::default();
        let _session = TipTapSession::open(
            config(),
            SessionEnv {
                page: &page,
                connector: &connector,
            },
        )
        .unwrap();
        connector.events().on_open();

        let first = HocusFrame::decode(&connector.take_sent()[0]).unwrap();
        assert_eq!(first.document, "room1");
        assert_eq!(first.message, HocusMessage::Auth(AuthMessage::Token(String::new())));
    }

    #[test]
    fn test_presence_shares_session_document() {
        let page = page();
        let connector = LoopbackConnector::default();
        let session = TipTapSession::open(
            config(),
            SessionEnv {
                page: &page,
                connector: &connector,
            },
        )
        .unwrap();
        assert_eq!(session.provider().client_id(), session.handle().doc.client_id());
        assert!(crate::presence::PRESENCE_COLORS.contains(&session.user().color.as_str()));
    }

    #[test]
    fn test_close_keeps_supplied_element() {
        let container = Rc::new(RecordingMount::new("editor-container"));
        let page = FakePage {
            container: Some(container.clone()),
            ..Default::default()
        };
        let connector = LoopbackConnector::default();
        let session = TipTapSession::open(
            config(),
            SessionEnv {
                page: &page,
                connector: &connector,
            },
        )
        .unwrap();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(*container.removed.borrow());
    }
}
