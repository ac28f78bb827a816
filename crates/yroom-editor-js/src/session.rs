//! JS handle for a running editor session.

use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Interval;
use miette::Diagnostic;
use wasm_bindgen::prelude::*;
use yroom_editor_browser::{
    BrowserConnector, BrowserPage, EditorSession, KeydownResult, SETTINGS_ELEMENT_ID,
    close_on_pagehide, listen_keydown, start, start_heartbeat,
};

/// Log a failure with its diagnostic code and convert it for JS.
fn to_js_error<E: Diagnostic>(err: E) -> JsError {
    let code = err
        .code()
        .or_else(|| err.diagnostic_source().and_then(|source| source.code()))
        .map(|code| code.to_string())
        .unwrap_or_else(|| "yroom".to_string());
    tracing::error!(%code, error = %err, "editor error");
    JsError::new(&err.to_string())
}

/// The page's editor session.
///
/// Closes itself on `pagehide`. Calling `close()` earlier is fine; the
/// session only tears down once, even from inside an `onStatus` callback.
#[wasm_bindgen]
pub struct JsEditorSession {
    session: Rc<EditorSession>,
    _pagehide: Option<EventListener>,
    _keydown: Option<EventListener>,
    _heartbeat: Interval,
}

/// Start the editor the page's settings ask for.
///
/// `settingsElement` defaults to `room-settings`. Throws without mounting or
/// connecting anything if the settings are missing, malformed or name an
/// unknown editor.
#[wasm_bindgen(js_name = startFromPage)]
pub fn start_from_page(settings_element: Option<String>) -> Result<JsEditorSession, JsError> {
    let page = BrowserPage::new().map_err(to_js_error)?;
    let element_id = settings_element.as_deref().unwrap_or(SETTINGS_ELEMENT_ID);
    let session = start(&page, &BrowserConnector, element_id).map_err(to_js_error)?;

    let editor_id = session.handle().view.element_id();
    let session = Rc::new(session);

    let keydown = page.document().get_element_by_id(&editor_id).map(|element| {
        let session = Rc::downgrade(&session);
        listen_keydown(&element, move |combo| {
            let Some(session) = session.upgrade() else {
                return KeydownResult::NotHandled;
            };
            session.handle_key(combo).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "key binding failed");
                KeydownResult::NotHandled
            })
        })
    });
    if keydown.is_none() {
        tracing::debug!(editor_id, "no editor element for key bindings");
    }

    Ok(JsEditorSession {
        _pagehide: close_on_pagehide(session.clone()),
        _keydown: keydown,
        _heartbeat: start_heartbeat(&session),
        session,
    })
}

#[wasm_bindgen]
impl JsEditorSession {
    /// Leave the room and unmount the editor.
    pub fn close(&self) {
        self.session.close();
    }

    /// `"active"` or `"closed"`.
    pub fn state(&self) -> String {
        self.session.state().as_str().to_string()
    }

    /// `"connecting"`, `"connected"` or `"disconnected"`.
    pub fn status(&self) -> String {
        self.session.handle().status.as_str().to_string()
    }

    #[wasm_bindgen(js_name = isSynced)]
    pub fn is_synced(&self) -> bool {
        self.session.handle().synced
    }

    pub fn variant(&self) -> String {
        self.session.variant().as_str().to_string()
    }

    #[wasm_bindgen(js_name = roomName)]
    pub fn room_name(&self) -> String {
        self.session.handle().room.to_string()
    }

    #[wasm_bindgen(js_name = exportXml)]
    pub fn export_xml(&self) -> String {
        self.session.export_xml()
    }

    pub fn undo(&self) -> Result<bool, JsError> {
        self.session.undo().map_err(to_js_error)
    }

    pub fn redo(&self) -> Result<bool, JsError> {
        self.session.redo().map_err(to_js_error)
    }

    /// Publish the local selection to other participants.
    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&self, anchor: u32, head: u32) -> Result<(), JsError> {
        self.session
            .set_selection(anchor, head)
            .map_err(to_js_error)
    }

    /// Called with the new status string on every connection change.
    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: js_sys::Function) {
        self.session.on_status(move |status| {
            let this = JsValue::null();
            if let Err(e) = callback.call1(&this, &JsValue::from_str(status.as_str())) {
                tracing::warn!(error = ?e, status = status.as_str(), "status callback threw");
            }
        });
    }
}
