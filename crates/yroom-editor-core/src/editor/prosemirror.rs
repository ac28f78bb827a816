//! ProseMirror flavour: a plain view with collaboration plugins.

use std::rc::Rc;

use smol_str::SmolStr;

use super::cursor::{CursorLayer, PresenceChannel};
use super::keymap::Keymap;
use super::view::{EditorView, ViewOptions};
use crate::doc::CollabDoc;
use crate::error::EditorError;
use crate::platform::Mount;
use crate::presence::UserPresence;

/// Fragment the sync plugin binds to; y-prosemirror's default.
pub const PROSEMIRROR_FRAGMENT: &str = "prosemirror";

/// Id of the editor element inside the generated container.
pub const EDITOR_ELEMENT_ID: &str = "editor";

/// Class the editor element carries, for stylesheets targeting ProseMirror.
pub const EDITOR_CLASS: &str = "ProseMirror";

#[derive(Debug, Clone)]
pub enum Plugin {
    /// Bind the view to a fragment of the shared document.
    Sync { fragment: SmolStr },
    /// Show and publish collaboration cursors.
    Cursor,
    /// CRDT-aware undo history.
    Undo,
    Keymap(Keymap),
}

/// The plugin set collaborative rooms are configured with.
pub fn collab_plugins(is_mac: bool) -> Vec<Plugin> {
    vec![
        Plugin::Sync {
            fragment: SmolStr::new_static(PROSEMIRROR_FRAGMENT),
        },
        Plugin::Cursor,
        Plugin::Undo,
        Plugin::Keymap(Keymap::history(is_mac)),
    ]
}

/// Assemble a view from `plugins`.
///
/// A sync plugin is required; without one the view would have nothing to
/// render.
pub fn build_view(
    doc: &CollabDoc,
    presence: Rc<dyn PresenceChannel>,
    user: Option<UserPresence>,
    mount: Rc<dyn Mount>,
    plugins: Vec<Plugin>,
) -> Result<EditorView, EditorError> {
    let mut fragment_name = None;
    let mut options = ViewOptions::default();
    let mut wants_cursor = false;

    for plugin in plugins {
        match plugin {
            Plugin::Sync { fragment } => {
                if fragment_name.replace(fragment).is_some() {
                    return Err(EditorError::InvalidSetup("more than one sync plugin".into()));
                }
            }
            Plugin::Cursor => wants_cursor = true,
            Plugin::Undo => options.undo = true,
            Plugin::Keymap(keymap) => options.keymap = keymap,
        }
    }

    let Some(fragment_name) = fragment_name else {
        return Err(EditorError::InvalidSetup("no sync plugin".into()));
    };
    if wants_cursor {
        options.cursor = Some(CursorLayer::new(presence, user));
    }

    let fragment = doc.fragment(&fragment_name);
    EditorView::mount(doc, fragment, mount, options)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::Value;

    use super::*;
    use crate::awareness::ClientId;
    use crate::editor::view::testing::RecordingMount;

    #[derive(Default)]
    struct Silent(RefCell<usize>);

    impl PresenceChannel for Silent {
        fn publish(&self, _key: &str, _value: Value) {
            *self.0.borrow_mut() += 1;
        }

        fn peer_states(&self) -> Vec<(ClientId, Value)> {
            Vec::new()
        }
    }

    #[test]
    fn test_collab_plugins_bind_prosemirror_fragment() {
        let doc = CollabDoc::with_client_id(1);
        let presence = Rc::new(Silent::default());
        let view = build_view(
            &doc,
            presence.clone(),
            Some(UserPresence::new("A", "#000000")),
            Rc::new(RecordingMount::new(EDITOR_ELEMENT_ID)),
            collab_plugins(false),
        )
        .unwrap();

        view.append_paragraph("x");
        let fragment = doc.fragment(PROSEMIRROR_FRAGMENT);
        assert_eq!(doc.fragment_xml(&fragment), "<paragraph>x</paragraph>");
        assert!(view.can_undo());
        assert_eq!(*presence.0.borrow(), 1);
    }

    #[test]
    fn test_missing_sync_plugin_rejected() {
        let doc = CollabDoc::new();
        let result = build_view(
            &doc,
            Rc::new(Silent::default()),
            None,
            Rc::new(RecordingMount::new("editor")),
            vec![Plugin::Undo],
        );
        assert!(matches!(result, Err(EditorError::InvalidSetup(_))));
    }

    #[test]
    fn test_without_cursor_plugin_nothing_is_published() {
        let doc = CollabDoc::new();
        let presence = Rc::new(Silent::default());
        let view = build_view(
            &doc,
            presence.clone(),
            Some(UserPresence::new("A", "#000000")),
            Rc::new(RecordingMount::new("editor")),
            vec![Plugin::Sync {
                fragment: "prosemirror".into(),
            }],
        )
        .unwrap();
        view.set_selection(0, 1);
        assert_eq!(*presence.0.borrow(), 0);
    }
}
