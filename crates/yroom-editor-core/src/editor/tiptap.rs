//! TipTap flavour: an editor assembled from extensions.

use std::rc::Rc;

use smol_str::SmolStr;

use super::cursor::{CursorLayer, PresenceChannel};
use super::keymap::Keymap;
use super::view::{EditorView, ViewOptions};
use crate::doc::CollabDoc;
use crate::error::EditorError;
use crate::platform::Mount;
use crate::presence::UserPresence;

/// Document field the collaboration extension binds to.
pub const TIPTAP_FIELD: &str = "content";

/// Element the hosting page provides for the editor.
pub const MOUNT_SELECTOR: &str = "#editor-container";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// Baseline editing behaviour. `history` is the editor's own undo stack.
    StarterKit { history: bool },
    /// Bind content to a field of the shared document, with CRDT-aware undo.
    Collaboration { field: SmolStr },
    /// Show other participants' cursors and publish ours as `user`.
    CollaborationCursor { user: UserPresence },
}

/// The extension set collaborative rooms are configured with.
pub fn collab_extensions(user: UserPresence) -> Vec<Extension> {
    vec![
        Extension::StarterKit { history: false },
        Extension::Collaboration {
            field: SmolStr::new_static(TIPTAP_FIELD),
        },
        Extension::CollaborationCursor { user },
    ]
}

/// A TipTap editor instance.
pub struct Editor {
    view: EditorView,
    extensions: Vec<Extension>,
}

impl Editor {
    /// Build the editor and mount it into `element`.
    ///
    /// Native history cannot be combined with collaboration: its undo stack
    /// would revert other participants' edits.
    pub fn new(
        doc: &CollabDoc,
        presence: Rc<dyn PresenceChannel>,
        element: Rc<dyn Mount>,
        extensions: Vec<Extension>,
        is_mac: bool,
    ) -> Result<Self, EditorError> {
        let mut native_history = false;
        let mut field = None;
        let mut cursor_user = None;

        for extension in &extensions {
            match extension {
                Extension::StarterKit { history } => native_history |= *history,
                Extension::Collaboration { field: name } => {
                    if field.replace(name.clone()).is_some() {
                        return Err(EditorError::InvalidSetup(
                            "collaboration extension registered twice".into(),
                        ));
                    }
                }
                Extension::CollaborationCursor { user } => cursor_user = Some(user.clone()),
            }
        }

        let Some(field) = field else {
            return Err(EditorError::InvalidSetup(
                "collaboration extension is required".into(),
            ));
        };
        if native_history {
            return Err(EditorError::InvalidSetup(
                "disable StarterKit history when using collaboration".into(),
            ));
        }

        let options = ViewOptions {
            undo: true,
            keymap: Keymap::history(is_mac),
            cursor: cursor_user.map(|user| CursorLayer::new(presence, Some(user))),
        };
        let view = EditorView::mount(doc, doc.fragment(&field), element, options)?;
        Ok(Self { view, extensions })
    }

    pub fn view(&self) -> &EditorView {
        &self.view
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Whether the editor keeps its own undo stack.
    pub fn has_native_history(&self) -> bool {
        self.extensions
            .iter()
            .any(|e| matches!(e, Extension::StarterKit { history: true }))
    }

    pub fn destroy(&self) {
        self.view.unmount();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::awareness::ClientId;
    use crate::editor::view::testing::RecordingMount;

    struct NoPeers;

    impl PresenceChannel for NoPeers {
        fn publish(&self, _key: &str, _value: Value) {}

        fn peer_states(&self) -> Vec<(ClientId, Value)> {
            Vec::new()
        }
    }

    #[test]
    fn test_collab_editor_binds_content_field() {
        let doc = CollabDoc::with_client_id(1);
        let editor = Editor::new(
            &doc,
            Rc::new(NoPeers),
            Rc::new(RecordingMount::new("editor-container")),
            collab_extensions(UserPresence::new("A", "#ff0000")),
            false,
        )
        .unwrap();

        assert!(!editor.has_native_history());
        editor.view().append_paragraph("hi");
        let content = doc.fragment(TIPTAP_FIELD);
        assert_eq!(doc.fragment_xml(&content), "<paragraph>hi</paragraph>");
    }

    #[test]
    fn test_history_with_collaboration_rejected() {
        let doc = CollabDoc::new();
        let result = Editor::new(
            &doc,
            Rc::new(NoPeers),
            Rc::new(RecordingMount::new("editor-container")),
            vec![
                Extension::StarterKit { history: true },
                Extension::Collaboration {
                    field: "content".into(),
                },
            ],
            false,
        );
        assert!(matches!(result, Err(EditorError::InvalidSetup(_))));
    }

    #[test]
    fn test_collaboration_required() {
        let doc = CollabDoc::new();
        let result = Editor::new(
            &doc,
            Rc::new(NoPeers),
            Rc::new(RecordingMount::new("editor-container")),
            vec![Extension::StarterKit { history: false }],
            false,
        );
        assert!(result.is_err());
    }
}
