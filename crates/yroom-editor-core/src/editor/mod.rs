//! Editor composition: a view over the shared document plus the
//! collaboration layers (cursors, CRDT undo, key bindings) each integration
//! configures.

pub mod cursor;
pub mod keymap;
pub mod prosemirror;
pub mod tiptap;
pub mod view;

pub use cursor::{CursorLayer, PresenceChannel, RemoteCursor, Selection};
pub use keymap::{Command, Key, KeyCombo, KeydownResult, Keymap, Modifiers};
pub use view::{EditorView, ViewOptions};
