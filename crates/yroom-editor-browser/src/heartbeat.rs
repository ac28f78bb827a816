//! Presence heartbeat.

use std::rc::Rc;

use gloo_timers::callback::Interval;
use yroom_editor_core::{EditorSession, OUTDATED_TIMEOUT_MS, SessionState};

/// Period of the presence clock.
pub const HEARTBEAT_MS: u32 = (OUTDATED_TIMEOUT_MS / 10.0) as u32;

/// Tick `session` with the wall clock every [`HEARTBEAT_MS`], so our presence
/// is renewed and silent peers are dropped.
///
/// The interval holds the session weakly. Keep it alive as long as the
/// session; dropping it stops the ticks.
pub fn start_heartbeat(session: &Rc<EditorSession>) -> Interval {
    session.tick(js_sys::Date::now());
    let session = Rc::downgrade(session);
    Interval::new(HEARTBEAT_MS, move || {
        let Some(session) = session.upgrade() else {
            return;
        };
        if session.state() == SessionState::Active {
            session.tick(js_sys::Date::now());
        }
    })
}
