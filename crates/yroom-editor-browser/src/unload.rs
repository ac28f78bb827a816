//! Session teardown when the page goes away.

use std::rc::Rc;

use gloo_events::EventListener;
use yroom_editor_core::EditorSession;

/// Close `session` on `pagehide` so peers drop our presence right away
/// instead of waiting for the server to time the socket out.
///
/// Keep the returned listener alive as long as the session.
pub fn close_on_pagehide(session: Rc<EditorSession>) -> Option<EventListener> {
    let window = web_sys::window()?;
    Some(EventListener::new(&window, "pagehide", move |_| {
        tracing::debug!("pagehide, closing session");
        session.close();
    }))
}
