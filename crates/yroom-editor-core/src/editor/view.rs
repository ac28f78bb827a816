//! Editor view bound to one XML fragment and one mount point.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use yrs::types::xml::XmlFragmentRef;
use yrs::{GetString, Subscription, UndoManager, XmlElementPrelim, XmlFragment, XmlTextPrelim};

use super::cursor::{CursorLayer, RemoteCursor, Selection};
use super::keymap::{Command, KeyCombo, KeydownResult, Keymap};
use crate::doc::{CollabDoc, LOCAL_ORIGIN};
use crate::error::EditorError;
use crate::platform::Mount;

/// What a view is built with besides its document and mount.
#[derive(Default)]
pub struct ViewOptions {
    /// Track local edits in a CRDT-aware undo history.
    pub undo: bool,
    pub keymap: Keymap,
    pub cursor: Option<CursorLayer>,
}

/// Renders a shared fragment into a mount and applies local input to it.
///
/// The mount is re-rendered after every transaction on the document, local
/// or remote.
pub struct EditorView {
    doc: CollabDoc,
    fragment: XmlFragmentRef,
    mount: Rc<dyn Mount>,
    undo: RefCell<Option<UndoManager>>,
    keymap: Keymap,
    cursor: Option<CursorLayer>,
    render_sub: RefCell<Option<Subscription>>,
    mounted: Cell<bool>,
}

impl EditorView {
    pub fn mount(
        doc: &CollabDoc,
        fragment: XmlFragmentRef,
        mount: Rc<dyn Mount>,
        options: ViewOptions,
    ) -> Result<Self, EditorError> {
        let undo = options.undo.then(|| {
            let mut manager = UndoManager::new(doc.inner(), &fragment);
            manager.include_origin(LOCAL_ORIGIN);
            manager
        });

        mount.render_xml(&doc.fragment_xml(&fragment));
        let target = mount.clone();
        let rendered = fragment.clone();
        let render_sub = doc.observe_updates(move |txn, _, _| {
            target.render_xml(&rendered.get_string(txn));
        })?;

        tracing::debug!(element = %mount.element_id(), undo = undo.is_some(), "view mounted");
        Ok(Self {
            doc: doc.clone(),
            fragment,
            mount,
            undo: RefCell::new(undo),
            keymap: options.keymap,
            cursor: options.cursor,
            render_sub: RefCell::new(Some(render_sub)),
            mounted: Cell::new(true),
        })
    }

    pub fn element_id(&self) -> String {
        self.mount.element_id()
    }

    pub fn fragment(&self) -> &XmlFragmentRef {
        &self.fragment
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Serialized fragment content.
    pub fn export_xml(&self) -> String {
        self.doc.fragment_xml(&self.fragment)
    }

    /// Append a paragraph with plain text content as a local edit.
    pub fn append_paragraph(&self, text: &str) {
        let fragment = &self.fragment;
        self.doc.transact(|txn| {
            let paragraph = fragment.push_back(txn, XmlElementPrelim::empty("paragraph"));
            paragraph.push_back(txn, XmlTextPrelim::new(text));
        });
    }

    pub fn can_undo(&self) -> bool {
        self.undo
            .borrow()
            .as_ref()
            .is_some_and(|manager| manager.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.undo
            .borrow()
            .as_ref()
            .is_some_and(|manager| manager.can_redo())
    }

    /// Revert the last local change. Remote changes are never undone.
    pub fn undo(&self) -> Result<bool, EditorError> {
        let mut undo = self.undo.borrow_mut();
        let Some(manager) = undo.as_mut() else {
            return Ok(false);
        };
        manager
            .try_undo()
            .map_err(|e| EditorError::Undo(e.to_string()))
    }

    pub fn redo(&self) -> Result<bool, EditorError> {
        let mut undo = self.undo.borrow_mut();
        let Some(manager) = undo.as_mut() else {
            return Ok(false);
        };
        manager
            .try_redo()
            .map_err(|e| EditorError::Undo(e.to_string()))
    }

    pub fn handle_key(&self, combo: &KeyCombo) -> Result<KeydownResult, EditorError> {
        let Some(command) = self.keymap.lookup(combo) else {
            return Ok(KeydownResult::NotHandled);
        };
        tracing::trace!(?command, "key binding");
        match command {
            Command::Undo => self.undo()?,
            Command::Redo => self.redo()?,
        };
        Ok(KeydownResult::Handled)
    }

    /// Publish the local selection to the other participants.
    pub fn set_selection(&self, anchor: u32, head: u32) {
        if let Some(cursor) = &self.cursor {
            cursor.set_selection(Selection { anchor, head });
        }
    }

    pub fn remote_cursors(&self) -> Vec<RemoteCursor> {
        self.cursor
            .as_ref()
            .map(CursorLayer::remote_cursors)
            .unwrap_or_default()
    }

    /// Stop rendering and detach from the page. Safe to call repeatedly.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        self.render_sub.borrow_mut().take();
        self.undo.borrow_mut().take();
        self.mount.remove();
        tracing::debug!(element = %self.mount.element_id(), "view unmounted");
    }
}
